// lichen-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dependency::ResolveOptions;
use super::error::{LichenError, Result};
use super::policy::PolicyConfig;

pub const CONFIG_FILE_NAME: &str = "lichen.toml";
const DEFAULT_OUTPUT_DIR: &str = "target/licenses";

/// Whether a test-scoped artifact is valid regardless of its licenses, or
/// only when its licenses would otherwise fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestScopePrecedence {
    #[default]
    Unconditional,
    WhenUnapproved,
}

/// Boolean switches of an audit run. Persisted to `settings.json` before
/// every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub recursive: bool,
    pub skip_test_scope: bool,
    pub skip_provided_scope: bool,
    pub skip_optionals: bool,
    pub fail_fast: bool,
    pub skip: bool,
    pub cycle_includes_scope: bool,
    pub test_scope_precedence: TestScopePrecedence,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            skip_test_scope: true,
            skip_provided_scope: true,
            skip_optionals: true,
            fail_fast: false,
            skip: false,
            cycle_includes_scope: false,
            test_scope_precedence: TestScopePrecedence::Unconditional,
        }
    }
}

impl RunOptions {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            recursive: self.recursive,
            skip_test_scope: self.skip_test_scope,
            skip_provided_scope: self.skip_provided_scope,
            skip_optionals: self.skip_optionals,
            cycle_includes_scope: self.cycle_includes_scope,
        }
    }
}

/// On-disk shape of `lichen.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    index: Option<PathBuf>,
    options: RunOptions,
    policy: PolicyConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    /// Artifact index backing the metadata provider.
    pub index_path: Option<PathBuf>,
    pub options: RunOptions,
    pub policy: PolicyConfig,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            index_path: None,
            options: RunOptions::default(),
            policy: PolicyConfig::default(),
            source: None,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or from `./lichen.toml`, or from
    /// the platform config directory, in that order. Falls back to defaults
    /// when no file exists. `LICHEN_OUTPUT_DIR` and `LICHEN_INDEX` override
    /// the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        debug!("Loading lichen configuration");

        let mut config = match path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(LichenError::Config(format!(
                        "Configuration file '{}' does not exist",
                        explicit.display()
                    )));
                }
                Self::from_file(explicit)?
            }
            None => match default_locations().into_iter().find(|p| p.is_file()) {
                Some(found) => Self::from_file(&found)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| env::var(key).ok().filter(|v| !v.is_empty()));
        debug!(
            "Configuration loaded: output_dir={}, index={:?}",
            config.output_dir.display(),
            config.index_path
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file {}", path.display());
        let raw = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw).map_err(|e| {
            LichenError::Config(format!("Invalid configuration in '{}': {e}", path.display()))
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        Ok(Self {
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            index_path: file.index,
            options: file.options,
            policy: file.policy,
            source: None,
        })
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("LICHEN_OUTPUT_DIR") {
            debug!("LICHEN_OUTPUT_DIR overrides output directory: {}", dir);
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(index) = var("LICHEN_INDEX") {
            debug!("LICHEN_INDEX overrides artifact index: {}", index);
            self.index_path = Some(PathBuf::from(index));
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = ProjectDirs::from("", "", "lichen") {
        locations.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    locations
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_follow_documented_values() {
        let options = RunOptions::default();
        assert!(options.recursive);
        assert!(options.skip_test_scope);
        assert!(options.skip_provided_scope);
        assert!(options.skip_optionals);
        assert!(!options.fail_fast);
        assert!(!options.skip);
        assert!(!options.cycle_includes_scope);
        assert_eq!(options.test_scope_precedence, TestScopePrecedence::Unconditional);
    }

    #[test]
    fn parses_partial_file() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "out"
            index = "index.json"

            [options]
            fail_fast = true
            test_scope_precedence = "when_unapproved"

            [policy]
            style = "whitelist"
            valid_licenses = ["MIT"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.index_path, Some(PathBuf::from("index.json")));
        assert!(config.options.fail_fast);
        assert!(config.options.recursive);
        assert_eq!(
            config.options.test_scope_precedence,
            TestScopePrecedence::WhenUnapproved
        );
        assert_eq!(config.logs_dir(), PathBuf::from("out/logs"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml_str("colour = true").is_err());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let vars: HashMap<&str, &str> =
            [("LICHEN_OUTPUT_DIR", "/tmp/audit"), ("LICHEN_INDEX", "idx.json")].into();
        let mut config = Config::from_toml_str(r#"output_dir = "out""#).unwrap();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.output_dir, PathBuf::from("/tmp/audit"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/audit/logs"));
        assert_eq!(config.index_path, Some(PathBuf::from("idx.json")));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(missing.as_path())),
            Err(LichenError::Config(_))
        ));

        let present = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&present, "[options]\nskip = true\n").unwrap();
        let config = Config::from_file(&present).unwrap();
        assert!(config.options.skip);
        assert_eq!(config.source.as_deref(), Some(present.as_path()));
    }

    #[test]
    fn invalid_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[policy]\nstyle = \"nonsense\"\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(LichenError::Config(_))));
    }
}
