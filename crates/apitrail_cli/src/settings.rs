//! Settings file loading and validation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    IoError(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    ParseError(String),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("use_sources names unconfigured source: {0}")]
    UnknownSource(String),
}

/// One configured snapshot source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// Directory holding `builds.json`, optional `live.json`, and one
    /// `<hash>.json` per build.
    pub path: PathBuf,
}

/// Output file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// Cached patch manifest, read at startup and rewritten at the end.
    pub manifest: PathBuf,
    /// Search index, rewritten every run.
    pub search_index: PathBuf,
}

/// The parsed settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Source merge order. Empty means all configured sources in name
    /// order.
    #[serde(default)]
    pub use_sources: Vec<String>,

    /// Disables truncating history back to the newest live build.
    #[serde(default)]
    pub disable_rewind: bool,

    #[serde(default)]
    pub sources: HashMap<String, SourceSettings>,

    pub output: OutputSettings,

    /// Icon sheet index per class name; unlisted classes get zero.
    #[serde(default)]
    pub icons: HashMap<String, u8>,
}

impl Settings {
    /// The effective source order for merging.
    pub fn source_order(&self) -> Vec<String> {
        if self.use_sources.is_empty() {
            let mut names: Vec<String> = self.sources.keys().cloned().collect();
            names.sort();
            names
        } else {
            self.use_sources.clone()
        }
    }
}

/// Loads and validates settings from a file.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path)?;
    load_settings_from_str(&content)
}

/// Parses and validates settings from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_settings_from_str(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| SettingsError::ParseError(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.sources.is_empty() {
        return Err(SettingsError::MissingField("sources".to_string()));
    }
    if settings.output.manifest.as_os_str().is_empty() {
        return Err(SettingsError::MissingField("output.manifest".to_string()));
    }
    if settings.output.search_index.as_os_str().is_empty() {
        return Err(SettingsError::MissingField(
            "output.search_index".to_string(),
        ));
    }
    for name in &settings.use_sources {
        if !settings.sources.contains_key(name) {
            return Err(SettingsError::UnknownSource(name.clone()));
        }
    }
    Ok(())
}
