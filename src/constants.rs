//! Constants used throughout the application.
//!
//! This module contains all constants used in the Daybook application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "daybook";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A personal diary backed by plain text files";

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Log level used when `--verbose` is passed.
pub const VERBOSE_LOG_LEVEL: &str = "debug";

// Configuration Keys & Environment Variables
/// Environment variable for specifying the diary storage directory.
pub const ENV_VAR_DAYBOOK_DIR: &str = "DAYBOOK_DIR";
/// Environment variable for the autosave interval in seconds.
pub const ENV_VAR_DAYBOOK_AUTOSAVE_SECS: &str = "DAYBOOK_AUTOSAVE_SECS";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default sub-directory name for diary entries within the user's home directory.
pub const DEFAULT_ENTRIES_SUBDIR: &str = "Documents/daybook";
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Autosave
/// Default autosave interval in seconds.
pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;
/// Largest accepted autosave interval in seconds.
pub const MAX_AUTOSAVE_SECS: u64 = 3600;

// File System Parameters
/// File extension for diary entries.
pub const ENTRY_FILE_EXTENSION: &str = ".txt";
/// Replacement for characters outside `[A-Za-z0-9]` in entry filenames.
pub const FILENAME_PLACEHOLDER: char = '_';
/// Timestamp prefix format for entry filenames (YYYYMMDD_HHMMSS).
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Default POSIX permissions for a newly created entries directory (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly written entry files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

// Date/Time Logic
/// Date format used in list labels (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";

// Status texts
/// Status shown when a fresh entry is started.
pub const STATUS_NEW_ENTRY: &str = "New Entry";
/// Status shown while an autosave is running.
pub const STATUS_AUTOSAVING: &str = "Auto-saving...";
/// Status shown after a delete completes.
pub const STATUS_ENTRY_DELETED: &str = "Entry deleted";
/// Status shown when an intent is refused because a save is outstanding.
pub const STATUS_SAVE_IN_PROGRESS: &str = "Save in progress";
/// Status shown when an intent is refused because a delete is outstanding.
pub const STATUS_DELETE_IN_PROGRESS: &str = "Delete in progress";
