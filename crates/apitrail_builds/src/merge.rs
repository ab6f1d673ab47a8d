//! Patch history maintenance.

use apitrail_model::Snapshot;
use apitrail_source::SourceSet;
use log::{info, warn};

use crate::{diff_snapshots, Build, BuildError, Patch};

/// Walks the normalized build list and produces the updated patch history.
///
/// For each build, a cached patch is reused when it describes the same
/// build and chains from the same predecessor; otherwise the build's
/// snapshot is fetched and diffed against the previous build's. A build
/// whose snapshot cannot be fetched is skipped without advancing the
/// predecessor, so the next build diffs across the gap. Reused patches come
/// out with `stale` cleared; recomputed ones with `stale` set.
pub fn merge_builds(
    sources: &SourceSet,
    builds: &[Build],
    cached: &[Patch],
) -> Result<Vec<Patch>, BuildError> {
    let mut patches: Vec<Patch> = Vec::new();
    let mut latest: Option<Build> = None;

    for build in builds {
        if let Some(cached_patch) = cached.iter().find(|p| p.info == build.info) {
            let chains = match (&latest, &cached_patch.prev) {
                (None, None) => true,
                (Some(l), Some(p)) => l.info == *p,
                _ => false,
            };
            if chains {
                patches.push(Patch {
                    stale: false,
                    ..cached_patch.clone()
                });
                latest = Some(Build {
                    info: build.info.clone(),
                    config: build.config.clone(),
                    snapshot: None,
                });
                continue;
            }
            warn!(
                "stale patch for build {}: cached predecessor does not match, recomputing",
                build.info
            );
        } else {
            info!("new build {}", build.info);
        }

        let source = sources
            .get(&build.config)
            .ok_or_else(|| BuildError::UnknownSource(build.config.clone()))?;
        let next = match source.snapshot(&build.info.hash) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("skipping build {}: {err}", build.info);
                continue;
            }
        };

        let prev_snapshot = match &mut latest {
            None => None,
            Some(prev) => {
                if prev.snapshot.is_none() {
                    let prev_source = sources
                        .get(&prev.config)
                        .ok_or_else(|| BuildError::UnknownSource(prev.config.clone()))?;
                    match prev_source.snapshot(&prev.info.hash) {
                        Ok(snapshot) => prev.snapshot = Some(snapshot),
                        Err(err) => {
                            warn!("skipping build {}: predecessor snapshot: {err}", build.info);
                            continue;
                        }
                    }
                }
                prev.snapshot.as_ref()
            }
        };

        let actions = diff_snapshots(prev_snapshot, &next);
        patches.push(Patch {
            info: build.info.clone(),
            prev: latest.as_ref().map(|l| l.info.clone()),
            config: build.config.clone(),
            actions,
            stale: true,
        });
        latest = Some(Build {
            info: build.info.clone(),
            config: build.config.clone(),
            snapshot: Some(next),
        });
    }

    for patch in &mut patches {
        for (index, action) in patch.actions.iter_mut().enumerate() {
            action.index = index;
        }
    }
    Ok(patches)
}
