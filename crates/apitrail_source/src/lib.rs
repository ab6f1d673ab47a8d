//! Build metadata and snapshot sources.
//!
//! A source publishes three things: an ordered list of builds it has seen,
//! an optional list of builds it still considers live, and one full API
//! [`Snapshot`](apitrail_model::Snapshot) per build hash. The pipeline
//! consumes sources through the [`SnapshotSource`] trait so the merge and
//! diff stages never know where the data came from.

mod build;
mod dir;

use std::io;
use std::path::PathBuf;

use apitrail_model::Snapshot;
use thiserror::Error;

pub use build::{BuildInfo, Version};
pub use dir::{DirSource, SourceSet};

/// Errors produced while reading from a snapshot source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A file belonging to the source could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file was read but did not parse as the expected JSON shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A provider of build metadata and per-build API snapshots.
pub trait SnapshotSource {
    /// Returns every build the source knows about, in the source's own
    /// publication order.
    fn builds(&self) -> Result<Vec<BuildInfo>, SourceError>;

    /// Returns the builds the source still reports as live. An empty list
    /// means the source makes no liveness claims.
    fn live(&self) -> Result<Vec<BuildInfo>, SourceError>;

    /// Fetches the full API snapshot recorded for the given build hash.
    fn snapshot(&self, hash: &str) -> Result<Snapshot, SourceError>;
}
