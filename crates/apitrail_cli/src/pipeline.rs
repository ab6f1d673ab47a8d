//! The update pipeline.
//!
//! One run reads the cached manifest, collects and normalizes builds from
//! every configured source, merges new patches into the history, rebuilds
//! the entity graph, and writes the search index and the manifest back
//! out. The manifest is replaced atomically so an interrupted run leaves
//! the previous history intact.

use std::fs;
use std::io;
use std::path::Path;

use apitrail_builds::{fetch_builds, merge_builds, BuildError, Patch};
use apitrail_codec::{decode_manifest, encode_manifest, encode_search_index, CodecError};
use apitrail_graph::{build_graph, GraphError};
use apitrail_source::{DirSource, SourceSet};
use log::info;
use thiserror::Error;

use crate::settings::Settings;

/// Errors produced by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The manifest exists but cannot be decoded. Regenerating silently
    /// would discard attribution history, so this is fatal; rerun with
    /// `--force` to rebuild from scratch.
    #[error("manifest {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: CodecError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: CodecError,
    },
}

/// Runs the full update. `force` ignores the cached manifest and
/// recomputes every patch.
pub fn run(settings: &Settings, force: bool) -> Result<(), PipelineError> {
    let cached = if force {
        info!("forced run, ignoring cached manifest");
        Vec::new()
    } else {
        read_manifest(&settings.output.manifest)?
    };

    let mut sources = SourceSet::new();
    for name in settings.source_order() {
        // Validation guarantees every ordered name is configured.
        if let Some(source) = settings.sources.get(&name) {
            sources.insert(name, Box::new(DirSource::new(&source.path)));
        }
    }

    let builds = fetch_builds(&sources, settings.disable_rewind)?;
    info!("{} builds after normalization", builds.len());

    let patches = merge_builds(&sources, &builds, &cached)?;
    let fresh = patches.iter().filter(|p| p.stale).count();
    info!("{} patches in history, {fresh} recomputed", patches.len());

    let graph = build_graph(&patches)?;
    info!(
        "graph: {} classes, {} enums, {} types",
        graph.classes.len(),
        graph.enums.len(),
        graph.types.len()
    );

    let mut index = Vec::new();
    encode_search_index(&graph, &settings.icons, &mut index).map_err(|source| {
        PipelineError::Encode {
            path: settings.output.search_index.display().to_string(),
            source,
        }
    })?;
    write_atomic(&settings.output.search_index, &index)?;

    let mut manifest = Vec::new();
    encode_manifest(&patches, &mut manifest).map_err(|source| PipelineError::Encode {
        path: settings.output.manifest.display().to_string(),
        source,
    })?;
    write_atomic(&settings.output.manifest, &manifest)?;
    Ok(())
}

/// Reads the cached manifest. A missing file is an empty history.
fn read_manifest(path: &Path) -> Result<Vec<Patch>, PipelineError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(PipelineError::Manifest {
                path: path.display().to_string(),
                source: CodecError::Io(err),
            })
        }
    };
    decode_manifest(bytes.as_slice()).map_err(|source| PipelineError::Manifest {
        path: path.display().to_string(),
        source,
    })
}

/// Writes to a sibling temp file, then renames over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let wrap = |source: io::Error| PipelineError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, bytes).map_err(wrap)?;
    fs::rename(tmp, path).map_err(wrap)?;
    Ok(())
}
