//! Configuration management for the daybook application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults. It supports configuring the entries directory
//! and the autosave interval.
//!
//! # Environment Variables
//!
//! - `DAYBOOK_DIR`: Path to the entries directory (defaults to ~/Documents/daybook)
//! - `DAYBOOK_AUTOSAVE_SECS`: Seconds between autosave checks (defaults to 30)
//! - `HOME`: Used for expanding the default entries directory path

use crate::constants::{
    DEFAULT_AUTOSAVE_SECS, DEFAULT_ENTRIES_SUBDIR, ENV_VAR_DAYBOOK_AUTOSAVE_SECS,
    ENV_VAR_DAYBOOK_DIR, ENV_VAR_HOME, MAX_AUTOSAVE_SECS, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the daybook application.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use daybook::Config;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let config = Config {
///     entries_dir: PathBuf::from("/path/to/diary"),
///     autosave_interval: Duration::from_secs(30),
/// };
/// assert!(config.validate().is_ok());
/// ```
pub struct Config {
    /// Directory where entry files are stored.
    ///
    /// Loaded from `DAYBOOK_DIR` with a fallback to ~/Documents/daybook.
    pub entries_dir: PathBuf,

    /// How often the editing session checks for unsaved changes.
    pub autosave_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entries_dir", &REDACTED_PLACEHOLDER)
            .field("autosave_interval", &self.autosave_interval)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            entries_dir: PathBuf::from(""),
            autosave_interval: Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// The entries directory is expanded with `shellexpand`, so `~` and
    /// environment variable references work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - The entries directory path expansion fails or yields an empty path
    /// - `DAYBOOK_AUTOSAVE_SECS` is not a whole number between 1 and 3600
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use daybook::Config;
    ///
    /// match Config::load() {
    ///     Ok(config) => println!("Autosave every {:?}", config.autosave_interval),
    ///     Err(err) => eprintln!("Failed to load config: {}", err),
    /// }
    /// ```
    pub fn load() -> AppResult<Self> {
        let entries_dir_str = env::var(ENV_VAR_DAYBOOK_DIR).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_ENTRIES_SUBDIR)
        });
        let entries_dir = Self::expand_dir(&entries_dir_str)?;

        let autosave_interval = match env::var(ENV_VAR_DAYBOOK_AUTOSAVE_SECS) {
            Ok(raw) => Self::parse_autosave_secs(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
        };

        Ok(Config {
            entries_dir,
            autosave_interval,
        })
    }

    /// Replaces the entries directory, expanding `~` and variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if expansion fails or yields an empty path.
    pub fn with_entries_dir(mut self, dir: &str) -> AppResult<Self> {
        self.entries_dir = Self::expand_dir(dir)?;
        Ok(self)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` with one of the following messages:
    /// - "Entries directory path is empty"
    /// - "Entries directory must be an absolute path"
    /// - "Autosave interval must be between 1 and 3600 seconds"
    pub fn validate(&self) -> AppResult<()> {
        if self.entries_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Entries directory path is empty".to_string(),
            ));
        }

        if !self.entries_dir.is_absolute() {
            return Err(AppError::Config(
                "Entries directory must be an absolute path".to_string(),
            ));
        }

        let secs = self.autosave_interval.as_secs();
        if secs == 0 || secs > MAX_AUTOSAVE_SECS {
            return Err(AppError::Config(format!(
                "Autosave interval must be between 1 and {} seconds",
                MAX_AUTOSAVE_SECS
            )));
        }

        Ok(())
    }

    fn expand_dir(raw: &str) -> AppResult<PathBuf> {
        let expanded = shellexpand::full(raw)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;

        let dir = PathBuf::from(expanded.into_owned());
        if dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Entries directory path is empty".to_string(),
            ));
        }
        Ok(dir)
    }

    fn parse_autosave_secs(raw: &str) -> AppResult<Duration> {
        let secs: u64 = raw.trim().parse().map_err(|_| {
            AppError::Config(format!(
                "{} must be a whole number of seconds, got '{}'",
                ENV_VAR_DAYBOOK_AUTOSAVE_SECS, raw
            ))
        })?;

        if secs == 0 || secs > MAX_AUTOSAVE_SECS {
            return Err(AppError::Config(format!(
                "Autosave interval must be between 1 and {} seconds",
                MAX_AUTOSAVE_SECS
            )));
        }
        Ok(Duration::from_secs(secs))
    }
}
