//! Results pipeline: resolve → normalize → clean → aggregate → export.

mod aggregate;
mod clean;
mod export;
mod normalize;
mod render;
mod resolve;
mod run;

pub use run::run;
pub(crate) use resolve::SourceResolver;

use aggregate::*;
use clean::*;
use export::*;
use normalize::*;
use render::*;
use resolve::*;
