//! Exporter configuration.
//!
//! Settings live in an optional JSON file, `~/.gsexport.json` by default.
//! A missing default file means built-in defaults; a file that exists but
//! does not parse is an error. Command-line flags override file values.

use crate::error::{ExportError, Result};
use crate::profile::DEFAULT_SCHOLAR_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default config file path: `~/.gsexport.json`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".gsexport.json"))
        .ok_or_else(|| ExportError::Config("Cannot determine home directory".to_string()))
}

/// Exporter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Origin used to absolutize relative links
    pub base_url: String,
    /// Directory export files are written to
    pub output_dir: PathBuf,
    /// Upper bound on "Show more" activations
    pub max_load_clicks: u32,
    /// Wait after each "Show more" activation
    pub load_delay_ms: u64,
    /// Wait after opening the Export menu, before the first link lookup
    pub export_menu_delay_ms: u64,
    /// Waits before each further BibTeX link lookup
    pub link_poll_delays_ms: Vec<u64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            output_dir: PathBuf::from("./output"),
            max_load_clicks: 200,
            load_delay_ms: 900,
            export_menu_delay_ms: 250,
            link_poll_delays_ms: vec![400, 600],
        }
    }
}

impl ExportConfig {
    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| ExportError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))
    }

    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }

    pub fn export_menu_delay(&self) -> Duration {
        Duration::from_millis(self.export_menu_delay_ms)
    }

    pub fn link_poll_delays(&self) -> Vec<Duration> {
        self.link_poll_delays_ms.iter().copied().map(Duration::from_millis).collect()
    }
}

/// Loads and saves [`ExportConfig`] files
pub struct ConfigStore {
    path: PathBuf,
    explicit: bool,
}

impl ConfigStore {
    /// Store at the default path
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_config_path()?,
            explicit: false,
        })
    }

    /// Store at a path given by the user; the file must exist
    pub fn with_path(path: PathBuf) -> Self {
        Self { path, explicit: true }
    }

    /// Store at `path` when given, else at the default path
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::with_path(path)),
            None => Self::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file
    pub fn load(&self) -> Result<ExportConfig> {
        if !self.path.exists() {
            if self.explicit {
                return Err(ExportError::Config(format!(
                    "Config file not found: {}",
                    self.path.display()
                )));
            }
            debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ExportConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: ExportConfig = serde_json::from_str(&content).map_err(|e| {
            ExportError::Config(format!("Invalid config file {}: {}", self.path.display(), e))
        })?;
        config.base_url()?;
        info!(path = %self.path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config file
    pub fn save(&self, config: &ExportConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let store = ConfigStore::with_path(PathBuf::from("/nonexistent/gsexport.json"));
        assert!(matches!(store.load(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        write!(temp, r#"{{"max_load_clicks": 5, "link_poll_delays_ms": [10]}}"#)?;
        let config = ConfigStore::with_path(temp.path().to_path_buf()).load()?;
        assert_eq!(config.max_load_clicks, 5);
        assert_eq!(config.link_poll_delays(), vec![Duration::from_millis(10)]);
        assert_eq!(config.base_url, DEFAULT_SCHOLAR_URL);
        assert_eq!(config.load_delay(), Duration::from_millis(900));
        Ok(())
    }

    #[test]
    fn test_invalid_base_url_is_rejected() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        write!(temp, r#"{{"base_url": "not a url"}}"#)?;
        let result = ConfigStore::with_path(temp.path().to_path_buf()).load();
        assert!(matches!(result, Err(ExportError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let store = ConfigStore::with_path(temp.path().to_path_buf());
        let config = ExportConfig {
            output_dir: PathBuf::from("/tmp/exports"),
            ..Default::default()
        };
        store.save(&config)?;
        assert_eq!(store.load()?, config);
        Ok(())
    }
}
