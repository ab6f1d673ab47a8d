//! Build list normalization, snapshot diffing, and patch history upkeep.
//!
//! The pipeline runs in two stages. [`fetch_builds`] turns the raw build
//! lists published by every source into one normalized, date-ordered list.
//! [`merge_builds`] then walks that list, reusing cached patches where they
//! still chain correctly and diffing snapshots to produce new ones.

mod diff;
mod merge;
mod normalize;
mod patch;

use apitrail_source::SourceError;
use thiserror::Error;

pub use diff::diff_snapshots;
pub use merge::merge_builds;
pub use normalize::{fetch_builds, Build};
pub use patch::{merge_patches, subactions, Action, ActionKind, FieldChange, Patch, Target};

/// Errors produced by the build pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A source failed in a way the pipeline cannot work around.
    #[error("source {name}: {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },
    /// A build referenced a source name that is not configured.
    #[error("build references unknown source {0}")]
    UnknownSource(String),
}
