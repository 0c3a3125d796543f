use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Manifest timestamp, e.g. `2026-10-16T09:30:00Z`.
pub fn rfc3339_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// File-name-safe run stamp, e.g. `20261016T093000Z`.
pub fn run_stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn file_name_string(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 file name: {}", path.display()))
}

/// Hex SHA-256 of a result file, recorded so a run can be matched to its inputs.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open result file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::new(file), &mut hasher)
        .with_context(|| format!("failed to hash result file: {}", path.display()))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Writes a manifest or chart artifact, creating its directory first.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create json artifact: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to serialize json artifact: {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write json artifact: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn run_stamp_and_manifest_timestamp_share_the_instant() {
        let ts = Utc
            .with_ymd_and_hms(2026, 10, 16, 9, 30, 5)
            .single()
            .expect("valid timestamp");

        assert_eq!(run_stamp(ts), "20261016T093005Z");
        assert_eq!(rfc3339_utc(ts), "2026-10-16T09:30:05Z");
    }

    #[test]
    fn sha256_file_matches_known_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fast_100_trace.csv");
        fs::write(&path, "abc").expect("fixture");

        assert_eq!(
            sha256_file(&path).expect("hash"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn write_json_pretty_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visualizations").join("chart.json");

        write_json_pretty(&path, &serde_json::json!({ "kind": "bar" })).expect("write");

        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "{\n  \"kind\": \"bar\"\n}\n");
    }
}
