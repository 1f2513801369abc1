//! The diary entry value type and its plain-text file encoding.
//!
//! An entry file holds three parts: the title on the first line, the ISO-8601
//! timestamp on the second line, and everything after the second line break as
//! the content. Content may itself span many lines and is never re-joined.

use crate::constants::{
    DATE_FORMAT_ISO, ENTRY_FILE_EXTENSION, FILENAME_PLACEHOLDER, FILENAME_TIMESTAMP_FORMAT,
};
use chrono::{Local, NaiveDateTime};
use std::fmt;
use thiserror::Error;

/// Timestamp format written to the second line of every entry file.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Minute-resolution form accepted when reading older files.
const TIMESTAMP_FORMAT_MINUTES: &str = "%Y-%m-%dT%H:%M";

/// Reasons an entry file cannot be turned back into a record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file does not contain the title, timestamp and content lines.
    #[error("expected at least 3 lines, found {found}")]
    MissingLines {
        /// Number of lines actually present
        found: usize,
    },

    /// The second line is not a date-time.
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        /// The text found on the timestamp line
        value: String,
        /// The underlying parse failure
        #[source]
        source: chrono::ParseError,
    },

    /// The file is not valid UTF-8.
    #[error("entry is not valid UTF-8")]
    NotUtf8,
}

/// A single diary entry.
///
/// Records are replaced rather than edited once persisted: use
/// [`EntryRecord::replacement`] to derive the next version, which keeps the
/// original timestamp and backing file identifier.
///
/// # Examples
///
/// ```
/// use daybook::entry::EntryRecord;
/// use chrono::NaiveDate;
///
/// let timestamp = NaiveDate::from_ymd_opt(2024, 1, 15)
///     .unwrap()
///     .and_hms_opt(14, 30, 0)
///     .unwrap();
/// let entry = EntryRecord::with_timestamp("Trip", "Day 1", timestamp);
///
/// assert_eq!(entry.file_name(), "20240115_143000_Trip.txt");
/// assert_eq!(entry.to_string(), "Trip (2024-01-15)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Display label, also part of the file name.
    pub title: String,
    /// Free-form text, possibly markup.
    pub content: String,
    /// Creation moment; fixed once the entry is first saved.
    pub timestamp: NaiveDateTime,
    /// Name of the backing file relative to the storage directory, if any.
    pub file_id: Option<String>,
}

impl EntryRecord {
    /// Creates an unsaved entry stamped with the current local time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_timestamp(title, content, Local::now().naive_local())
    }

    /// Creates an unsaved entry with an explicit timestamp.
    pub fn with_timestamp(
        title: impl Into<String>,
        content: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        EntryRecord {
            title: title.into(),
            content: content.into(),
            timestamp,
            file_id: None,
        }
    }

    /// Builds the next version of this entry with new text.
    ///
    /// The timestamp and file identifier are carried over so the store can
    /// locate and remove the file backing `self`.
    pub fn replacement(&self, title: impl Into<String>, content: impl Into<String>) -> Self {
        EntryRecord {
            title: title.into(),
            content: content.into(),
            timestamp: self.timestamp,
            file_id: self.file_id.clone(),
        }
    }

    /// Derives the file name `<YYYYMMDD_HHMMSS>_<sanitized title>.txt`.
    ///
    /// Every character outside `[A-Za-z0-9]` in the title becomes `_`. Two
    /// entries created in the same second with titles that sanitize to the same
    /// text share a file name.
    pub fn file_name(&self) -> String {
        let sanitized: String = self
            .title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c
                } else {
                    FILENAME_PLACEHOLDER
                }
            })
            .collect();

        format!(
            "{}_{}{}",
            self.timestamp.format(FILENAME_TIMESTAMP_FORMAT),
            sanitized,
            ENTRY_FILE_EXTENSION
        )
    }

    /// Encodes the entry as the text written to its file.
    pub fn encode(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.title,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.content
        )
    }

    /// Decodes file text produced by [`EntryRecord::encode`].
    ///
    /// The returned record has no `file_id`; the store assigns it.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let mut parts = text.splitn(3, '\n');
        let (title, timestamp, content) = match (parts.next(), parts.next(), parts.next()) {
            (Some(title), Some(timestamp), Some(content)) => (title, timestamp, content),
            (_, Some(_), None) => return Err(DecodeError::MissingLines { found: 2 }),
            _ => {
                return Err(DecodeError::MissingLines {
                    found: usize::from(!text.is_empty()),
                })
            }
        };

        let timestamp = strip_cr(timestamp);
        let timestamp = parse_timestamp(timestamp).map_err(|source| {
            DecodeError::InvalidTimestamp {
                value: timestamp.to_string(),
                source,
            }
        })?;

        Ok(EntryRecord {
            title: strip_cr(title).to_string(),
            content: content.to_string(),
            timestamp,
            file_id: None,
        })
    }

    /// Case-insensitive substring match against title and content.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

impl fmt::Display for EntryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.title,
            self.timestamp.date().format(DATE_FORMAT_ISO)
        )
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_MINUTES))
}
