//! Configuration — defaults for new scene files and save behaviour.
//!
//! Read from `.smartsave.toml`:
//!
//! ```toml
//! descriptor = "main"
//! version = 1
//! extension = "ma"
//! match_policy = "exact"   # or "prefix"
//! exclusive = false        # refuse to overwrite existing files
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::discovery::MatchPolicy;
use crate::error::{Result, SmartSaveError};
use crate::scene::{DEFAULT_DESCRIPTOR, DEFAULT_EXTENSION, DEFAULT_VERSION};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".smartsave.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub descriptor: String,
    pub version: u32,
    pub extension: String,
    pub match_policy: MatchPolicy,
    pub exclusive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            version: DEFAULT_VERSION,
            extension: DEFAULT_EXTENSION.to_string(),
            match_policy: MatchPolicy::default(),
            exclusive: false,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SmartSaveError::Config(e.to_string()))
    }

    /// Load an explicit config file. Missing or invalid files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            SmartSaveError::Config(msg) => SmartSaveError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load `.smartsave.toml` from `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = Self::default_path(dir);
        match Self::load(&path) {
            Err(SmartSaveError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_toml("descriptor = \"ship\"\nmatch_policy = \"prefix\"\n").unwrap();
        assert_eq!(config.descriptor, "ship");
        assert_eq!(config.match_policy, MatchPolicy::Prefix);
        assert_eq!(config.version, 1);
        assert_eq!(config.extension, "ma");
        assert!(!config.exclusive);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml("match_policy = \"fuzzy\"").unwrap_err();
        assert!(matches!(err, SmartSaveError::Config(_)));
    }

    #[test]
    fn test_discover_without_file() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_discover_reads_file() {
        let dir = tempdir().unwrap();
        fs::write(Config::default_path(dir.path()), "extension = \"hip\"\nexclusive = true\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.extension, "hip");
        assert!(config.exclusive);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempdir().unwrap();
        assert!(Config::load(&dir.path().join("nope.toml")).is_err());
    }
}
