//! Directory-backed snapshot source.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use apitrail_model::Snapshot;
use serde::de::DeserializeOwned;

use crate::{BuildInfo, SnapshotSource, SourceError};

/// A snapshot source rooted at a directory.
///
/// Layout: `builds.json` holds the full build list, `live.json` (optional)
/// holds the currently live builds, and each snapshot lives in
/// `<hash>.json`.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, SourceError> {
        let path = self.root.join(name);
        let text = fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SourceError::Parse { path, source })
    }
}

impl SnapshotSource for DirSource {
    fn builds(&self) -> Result<Vec<BuildInfo>, SourceError> {
        self.read_json("builds.json")
    }

    fn live(&self) -> Result<Vec<BuildInfo>, SourceError> {
        // A source without a live list makes no liveness claims.
        if !self.root.join("live.json").exists() {
            return Ok(Vec::new());
        }
        self.read_json("live.json")
    }

    fn snapshot(&self, hash: &str) -> Result<Snapshot, SourceError> {
        if hash.contains(['/', '\\']) || hash == ".." {
            return Err(SourceError::Read {
                path: self.root.join(hash),
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid build hash"),
            });
        }
        self.read_json(&format!("{hash}.json"))
    }
}

/// An ordered collection of named snapshot sources.
///
/// Iteration order is insertion order, which the pipeline derives from the
/// configured source list. Later sources take precedence during merging.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<(String, Box<dyn SnapshotSource>)>,
}

impl SourceSet {
    pub fn new() -> Self {
        SourceSet::default()
    }

    /// Appends a source under the given name. A repeated name replaces the
    /// earlier source in place, keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, source: Box<dyn SnapshotSource>) {
        let name = name.into();
        if let Some(entry) = self.sources.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = source;
        } else {
            self.sources.push((name, source));
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn SnapshotSource> {
        self.sources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn SnapshotSource)> {
        self.sources.iter().map(|(n, s)| (n.as_str(), s.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use crate::Version;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        let mut file = File::create(dir.path().join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn build_json(hash: &str) -> String {
        format!(
            r#"{{"hash":"{hash}","date":"2024-03-01T12:00:00Z","version":{{"major":0,"minor":512,"maint":0,"build":100}}}}"#
        )
    }

    #[test]
    fn builds_parse_in_file_order() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "builds.json",
            &format!("[{},{}]", build_json("aaa"), build_json("bbb")),
        );
        let source = DirSource::new(dir.path());
        let builds = source.builds().unwrap();
        assert_eq!(builds.len(), 2);
        assert_eq!(builds[0].hash, "aaa");
        assert_eq!(builds[1].hash, "bbb");
        assert_eq!(
            builds[0].date,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap()
        );
        assert_eq!(builds[0].version, Version::new(0, 512, 0, 100));
    }

    #[test]
    fn missing_builds_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path());
        assert!(matches!(source.builds(), Err(SourceError::Read { .. })));
    }

    #[test]
    fn missing_live_list_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path());
        assert!(source.live().unwrap().is_empty());
    }

    #[test]
    fn malformed_live_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "live.json", "{not json");
        let source = DirSource::new(dir.path());
        assert!(matches!(source.live(), Err(SourceError::Parse { .. })));
    }

    #[test]
    fn snapshot_loads_by_hash() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "abc.json", r#"{"classes":[],"enums":[]}"#);
        let source = DirSource::new(dir.path());
        let snapshot = source.snapshot("abc").unwrap();
        assert!(snapshot.classes.is_empty());
        assert!(snapshot.enums.is_empty());
    }

    #[test]
    fn snapshot_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path());
        assert!(source.snapshot("../builds").is_err());
    }

    #[test]
    fn source_set_preserves_insertion_order() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let mut set = SourceSet::new();
        set.insert("primary", Box::new(DirSource::new(dir_a.path())));
        set.insert("mirror", Box::new(DirSource::new(dir_b.path())));
        let names: Vec<_> = set.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["primary", "mirror"]);
        assert!(set.get("mirror").is_some());
        assert!(set.get("absent").is_none());
    }

    #[test]
    fn source_set_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let mut set = SourceSet::new();
        set.insert("primary", Box::new(DirSource::new(dir.path())));
        set.insert("mirror", Box::new(DirSource::new(dir.path())));
        set.insert("primary", Box::new(DirSource::new(dir.path())));
        assert_eq!(set.len(), 2);
        let names: Vec<_> = set.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["primary", "mirror"]);
    }
}
