//! Configuration module for the `tutel` CLI (SPEC_FULL.md's "Configuration"
//! ambient-stack section).
//!
//! An optional `tutel.toml` project file sets defaults for the flags
//! `main.rs` exposes; CLI flags always override it. Follows the teacher's
//! `Config::load`/`load_from_path` convention of searching the current
//! directory, then the user's home config directory, then the system
//! config directory.

use std::path::{Path, PathBuf};

use dirs::{config_dir, home_dir};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TutelCliError};

pub const CONFIG_FILE_NAME: &str = "tutel.toml";

/// Project-level defaults for the flags spec.md §6's debugger wire
/// protocol and batch runner accept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Default entry function name (spec.md §4.4: `"main"` if absent).
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Default transport kind for `--debug` sessions: `"stdio"` or `"socket"`.
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Default socket address for the socket transport.
    #[serde(default)]
    pub addr: Option<String>,

    /// Global verbose setting.
    #[serde(default)]
    pub verbose: bool,
}

fn default_entry() -> String {
    "main".to_string()
}

fn default_transport() -> String {
    "stdio".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            transport: default_transport(),
            addr: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if no
    /// `tutel.toml` is found anywhere in the search path.
    pub fn load() -> Result<Self> {
        match Self::find_config_file()? {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TutelCliError::Config(format!("configuration file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TutelCliError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir().map(|dir| dir.join(".config").join("tutel").join(CONFIG_FILE_NAME)).filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("tutel").join(CONFIG_FILE_NAME)).filter(|path| path.exists())
    }

    fn find_config_file() -> Result<Option<PathBuf>> {
        Ok(Self::check_current_dir_config().or_else(Self::check_home_config).or_else(Self::check_system_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_uses_main_and_stdio() {
        let config = Config::default();
        assert_eq!(config.entry, "main");
        assert_eq!(config.transport, "stdio");
        assert!(config.addr.is_none());
    }

    #[test]
    fn loads_an_explicit_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tutel.toml");
        std::fs::write(&path, "entry = \"start\"\ntransport = \"socket\"\naddr = \"127.0.0.1:9000\"\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.entry, "start");
        assert_eq!(config.transport, "socket");
        assert_eq!(config.addr.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(Config::load_from_path(Path::new("/nonexistent/tutel.toml")).is_err());
    }
}
