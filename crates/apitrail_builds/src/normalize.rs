//! Build list normalization.

use std::collections::HashSet;

use apitrail_model::Snapshot;
use apitrail_source::{BuildInfo, SourceSet};
use log::{info, warn};

use crate::BuildError;

/// One build scheduled for processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Build {
    pub info: BuildInfo,
    /// Name of the source that published the build.
    pub config: String,
    /// Loaded lazily; only the previous build's snapshot is kept around
    /// while diffing.
    pub snapshot: Option<Snapshot>,
}

/// Collects builds from every source and normalizes the combined list.
///
/// Sources contribute in their configured order. Adjacent entries with the
/// same version are collapsed to the first, since a republished build with
/// an unchanged version carries no API difference worth a patch. Unless
/// `disable_rewind` is set, the list is then rewound to the most recent
/// build a source still reports as live, dropping anything published after
/// it; a retracted build would otherwise leave permanently dangling
/// history. Finally the list is sorted by date, oldest first.
pub fn fetch_builds(sources: &SourceSet, disable_rewind: bool) -> Result<Vec<Build>, BuildError> {
    let mut builds: Vec<Build> = Vec::new();
    for (name, source) in sources.iter() {
        let list = source.builds().map_err(|source_err| BuildError::Source {
            name: name.to_string(),
            source: source_err,
        })?;
        info!("source {name}: {} builds", list.len());
        for build_info in list {
            if let Some(last) = builds.last() {
                if last.info.version == build_info.version {
                    continue;
                }
            }
            builds.push(Build {
                info: build_info,
                config: name.to_string(),
                snapshot: None,
            });
        }
    }

    if !disable_rewind {
        rewind(sources, &mut builds);
    }

    builds.sort_by(|a, b| a.info.date.cmp(&b.info.date));
    Ok(builds)
}

/// Truncates the build list after the deepest entry still reported live.
///
/// A failure to fetch any live list disables the rewind for this run; a
/// transient fetch problem must not discard history.
fn rewind(sources: &SourceSet, builds: &mut Vec<Build>) {
    let mut live: HashSet<String> = HashSet::new();
    for (name, source) in sources.iter() {
        match source.live() {
            Ok(list) => live.extend(list.into_iter().map(|b| b.hash)),
            Err(err) => {
                warn!("source {name}: live list unavailable, skipping rewind: {err}");
                return;
            }
        }
    }
    if live.is_empty() {
        return;
    }

    let Some(last_live) = builds.iter().rposition(|b| live.contains(&b.info.hash)) else {
        return;
    };
    for dropped in &builds[last_live + 1..] {
        info!("rewind: dropping build {}", dropped.info);
    }
    builds.truncate(last_live + 1);
}
