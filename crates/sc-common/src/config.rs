//! Configuration loading and validation.
//!
//! Resolution order: explicit CLI path → `SCORECARD_CONFIG` env var →
//! `./scorecard.yaml` if present → built-in defaults. Unknown keys are a
//! hard error so a typo never silently falls back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scorecard.yaml";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SCORECARD_CONFIG";

/// Credentials for a remote object-store backend.
///
/// Parsed and validated here; consumed only by external storage backends
/// wired in by the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Bucket name.
    pub bucket: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directory for the local object store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Optional remote storage credentials.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote: None,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config from CLI flag, environment, or defaults.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data_dir must not be empty".into()));
        }
        if let Some(remote) = &self.remote {
            if remote.bucket.is_empty() {
                return Err(Error::Config("remote.bucket must not be empty".into()));
            }
            if remote.access_key.is_empty() || remote.secret_key.is_empty() {
                return Err(Error::Config(
                    "remote credentials must include access_key and secret_key".into(),
                ));
            }
        }
        Ok(())
    }
}
