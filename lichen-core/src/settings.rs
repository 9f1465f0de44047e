// lichen-core/src/settings.rs
use std::fs;
use std::path::{Path, PathBuf};

use lichen_common::config::RunOptions;
use lichen_common::error::{LichenError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SETTINGS_FILE: &str = "settings.json";

/// How an audit run was configured, stored next to its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    /// `group:artifact:version` of the audited root.
    pub root: String,
    pub options: RunOptions,
}

pub fn settings_file(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILE)
}

pub fn save_settings(dir: &Path, settings: &RunSettings) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = settings_file(dir);
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json)?;
    debug!("Stored run settings in {}", path.display());
    Ok(path)
}

pub fn load_settings(dir: &Path) -> Result<RunSettings> {
    let path = settings_file(dir);
    if !path.is_file() {
        return Err(LichenError::NotFound(format!(
            "Settings file '{}'",
            path.display()
        )));
    }
    let raw = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}
