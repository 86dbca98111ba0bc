//! Configuration management.
//!
//! Configuration comes from an optional TOML file, overridden by command-line
//! flags and their environment variables. Only the session identifier
//! reaches the protocol surface; everything else tunes logging and recall.
//!
//! ```toml
//! session_id = "my-project"
//! data_dir = "~/.engram-bridge"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! file = "/tmp/engram-bridge.log"
//!
//! [recall]
//! min_salience = "LOW"
//! ```

use crate::models::SalienceLevel;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config dir.
const APP_DIR_NAME: &str = "engram-bridge";

/// Session identifier used when none is configured.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Main configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Identifier of the session the store loads and saves.
    pub session_id: String,
    /// Root directory for session files.
    pub data_dir: PathBuf,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Recall settings.
    pub recall: RecallSettings,
    /// Default-location files that were found but could not be loaded.
    ///
    /// Lookup runs before logging exists, so these are reported by the caller
    /// once a subscriber is installed.
    pub skipped_files: Vec<SkippedConfigFile>,
}

/// A config file passed over during default lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConfigFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Why it was not used.
    pub reason: String,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default level filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format name (`json`, `pretty`, `compact`).
    pub format: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
            file: None,
        }
    }
}

/// Recall section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecallSettings {
    /// Memories below this level are never returned.
    pub min_salience: SalienceLevel,
}

impl Default for RecallSettings {
    fn default() -> Self {
        Self {
            min_salience: SalienceLevel::Noise,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Session identifier.
    pub session_id: Option<String>,
    /// Data directory. A leading `~` expands to the home directory.
    pub data_dir: Option<String>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Recall section.
    pub recall: Option<ConfigFileRecall>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Level filter.
    pub level: Option<String>,
    /// Output format.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Recall section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileRecall {
    /// Minimum salience name, case-insensitive.
    pub min_salience: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session_id: DEFAULT_SESSION_ID.to_string(),
            data_dir: default_data_dir(),
            logging: LoggingSettings::default(),
            recall: RecallSettings::default(),
            skipped_files: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on syntax errors, unknown keys, or an
    /// unknown salience name.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/engram-bridge/` on macOS)
    /// 2. XDG config dir (`~/.config/engram-bridge/` for Unix compatibility)
    ///
    /// A file that fails to load is skipped and recorded in
    /// [`Self::skipped_files`]. Returns the default configuration if no
    /// usable file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join(APP_DIR_NAME).join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join(APP_DIR_NAME)
                .join("config.toml"),
        ];
        Self::load_first_usable(&candidates)
    }

    /// Loads the first existing candidate that parses.
    fn load_first_usable(candidates: &[PathBuf]) -> Self {
        let mut skipped_files = Vec::new();

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(mut config) => {
                    config.skipped_files = skipped_files;
                    return config;
                },
                Err(e) => skipped_files.push(SkippedConfigFile {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        Self {
            skipped_files,
            ..Self::default()
        }
    }

    /// Logs every skipped default-location file. Call after logging is
    /// initialized.
    pub fn log_skipped_files(&self) {
        for skipped in &self.skipped_files {
            tracing::warn!(
                path = %skipped.path.display(),
                error = %skipped.reason,
                "Ignoring unusable config file"
            );
        }
    }

    /// Loads an explicitly requested file, or falls back to the default lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `path` is given and cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::load_default()), Self::load_from_file)
    }

    /// Builds configuration from a parsed config file.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(session_id) = file.session_id {
            config.session_id = session_id;
        }
        if let Some(data_dir) = file.data_dir {
            config.data_dir = expand_home(&data_dir);
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            config.logging.format = logging.format;
            config.logging.file = logging.file.as_deref().map(expand_home);
        }
        if let Some(recall) = file.recall
            && let Some(name) = recall.min_salience
        {
            config.recall.min_salience = SalienceLevel::parse(&name)
                .ok_or_else(|| Error::Config(format!("unknown salience level '{name}'")))?;
        }

        Ok(config)
    }

    /// Sets the session identifier. Empty values are ignored.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        if !session_id.trim().is_empty() {
            self.session_id = session_id;
        }
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the minimum recall salience.
    #[must_use]
    pub const fn with_min_salience(mut self, min_salience: SalienceLevel) -> Self {
        self.recall.min_salience = min_salience;
        self
    }
}

/// Returns `~/.engram-bridge`, or `.engram-bridge` without a home directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".engram-bridge"),
        |dirs| dirs.home_dir().join(".engram-bridge"),
    )
}

/// Expands a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, directories::BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}
