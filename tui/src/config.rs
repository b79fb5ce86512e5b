//! Settings for the terminal client.
//!
//! Values come from `config.toml`, overridden by command-line flags (which
//! clap also fills from `TASKS_*` environment variables). A missing default
//! config file is not an error; a missing explicit one is.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "tasks";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root; the client appends `/tasks`.
    pub api_url: String,
    pub timeout_secs: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 10,
            log_file: None,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn parse(text: &str) -> Result<Config> {
    toml::from_str(text).context("invalid config")
}

/// A config plus the file it was read from, if any.
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub source: Option<PathBuf>,
}

/// Loads `explicit` if given, else the platform default location.
pub fn load(explicit: Option<&Path>) -> Result<Loaded> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_file() {
            Some(path) if path.exists() => path,
            _ => {
                return Ok(Loaded {
                    config: Config::default(),
                    source: None,
                })
            }
        },
    };

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(Loaded {
        config,
        source: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse(r#"api_url = "http://tasks.local/api""#).unwrap();
        assert_eq!(config.api_url, "http://tasks.local/api");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(parse("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 3\nlog_file = \"/tmp/tasks.log\"\n").unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        let config = loaded.config;
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/tasks.log")));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config file"));
    }
}
