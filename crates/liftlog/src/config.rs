//! Configuration file support for liftlog.
//!
//! Loads `liftlog.toml` from the working directory, falling back to the
//! user config directory (`~/.config/liftlog/liftlog.toml` on Linux).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "liftlog.toml";

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings loaded from `liftlog.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LiftlogConfig {
    /// Whose logs are read and written
    pub athlete: Option<String>,
    /// SQLite database path (default: the platform data dir)
    pub database: Option<PathBuf>,
    /// Tracing filter when RUST_LOG is unset
    pub log_level: Option<String>,
    /// Append recorder events as JSON lines to this file
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// chrono format string for calendar dates in listings
    pub date_format: Option<String>,
}

impl LiftlogConfig {
    /// Load configuration from a directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: LiftlogConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// First config found in `working_dir`, then the user config dir,
    /// else defaults.
    pub fn discover(working_dir: &Path) -> Result<Self> {
        if let Some(config) = Self::load(working_dir)? {
            return Ok(config);
        }

        if let Some(user_dir) = dirs::config_dir().map(|d| d.join("liftlog")) {
            if let Some(config) = Self::load(&user_dir)? {
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    pub fn date_format(&self) -> &str {
        self.display
            .date_format
            .as_deref()
            .unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(LiftlogConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
athlete = "sam"
database = "/tmp/sam.db"
log_level = "debug"
log_file = "/tmp/liftlog.jsonl"

[display]
date_format = "%d/%m/%Y"
"#,
        )
        .unwrap();

        let config = LiftlogConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.athlete.as_deref(), Some("sam"));
        assert_eq!(config.database, Some(PathBuf::from("/tmp/sam.db")));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.date_format(), "%d/%m/%Y");
    }

    #[test]
    fn test_defaults() {
        let config = LiftlogConfig::default();
        assert_eq!(config.date_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "timezone = \"UTC\"\n").unwrap();

        let err = LiftlogConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_discover_prefers_working_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "athlete = \"local\"\n").unwrap();

        let config = LiftlogConfig::discover(dir.path()).unwrap();
        assert_eq!(config.athlete.as_deref(), Some("local"));
    }
}
