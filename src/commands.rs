pub mod analyze;
pub mod inventory;

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Nothing recognizable to report; the process exits non-zero.
    NoData,
}
