//! Build identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A four-component build version, displayed as `major.minor.maint.build`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub maint: u32,
    pub build: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, maint: u32, build: u32) -> Self {
        Version {
            major,
            minor,
            maint,
            build,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.maint, self.build
        )
    }
}

/// Identity of one build of the API.
///
/// Two builds are the same build only when hash, date, and version all
/// match; a republished hash with a new timestamp counts as a new build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Opaque identifier assigned by the source.
    pub hash: String,
    /// When the source published the build.
    pub date: DateTime<Utc>,
    /// Version number reported for the build.
    pub version: Version,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.hash,
            self.version,
            self.date.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info(hash: &str, secs: i64) -> BuildInfo {
        BuildInfo {
            hash: hash.to_string(),
            date: Utc.timestamp_opt(secs, 0).single().unwrap(),
            version: Version::new(0, 512, 0, 1234),
        }
    }

    #[test]
    fn version_display() {
        assert_eq!(Version::new(0, 512, 3, 99).to_string(), "0.512.3.99");
    }

    #[test]
    fn version_ordering_is_componentwise() {
        assert!(Version::new(0, 512, 0, 1) < Version::new(0, 513, 0, 0));
        assert!(Version::new(1, 0, 0, 0) > Version::new(0, 999, 9, 9));
    }

    #[test]
    fn build_equality_requires_all_fields() {
        let a = info("abc", 100);
        assert_eq!(a, info("abc", 100));
        assert_ne!(a, info("abc", 101));
        assert_ne!(a, info("abd", 100));
    }

    #[test]
    fn build_info_json_roundtrip() {
        let a = info("version-0123456789abcdef", 1_700_000_000);
        let text = serde_json::to_string(&a).unwrap();
        let b: BuildInfo = serde_json::from_str(&text).unwrap();
        assert_eq!(a, b);
    }
}
