//! Error handling utilities for the daybook application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents failures of the filesystem operations behind the entry store.
///
/// Each variant carries the path involved and the underlying I/O error so the
/// message shown to the user can point at the offending file.
///
/// # Examples
///
/// ```
/// use daybook::errors::StorageError;
/// use std::io::{self, ErrorKind};
/// use std::path::PathBuf;
///
/// let error = StorageError::Write {
///     path: PathBuf::from("/diary/20240115_143000_Trip.txt"),
///     source: io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
/// };
///
/// assert!(format!("{}", error).contains("Failed to write entry"));
/// assert!(format!("{}", error).contains("permission denied"));
/// ```
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage directory could not be created.
    #[error("Failed to create entries directory {path}: {source}. Please check that the parent directory exists and is writable.")]
    CreateDir {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An entry file could not be written.
    #[error("Failed to write entry {path}: {source}. Please check disk space and file permissions.")]
    Write {
        /// The file that could not be written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An entry file could not be removed.
    #[error("Failed to delete entry {path}: {source}")]
    Delete {
        /// The file that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The storage directory could not be read.
    #[error("Failed to read entries directory {path}: {source}")]
    Read {
        /// The directory that could not be read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents all possible errors that can occur in the daybook application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error` trait
/// implementation and formatted error messages.
///
/// Note: This type does not implement `Clone` to avoid losing error context when
/// cloning `std::io::Error` values.
///
/// # Examples
///
/// Creating a validation error:
/// ```
/// use daybook::errors::AppError;
///
/// let error = AppError::Validation("Title cannot be empty.".to_string());
/// assert_eq!(format!("{}", error), "Title cannot be empty.");
/// ```
///
/// Converting from an IO error:
/// ```
/// use daybook::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations outside the entry store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A user intent was rejected before any I/O took place.
    #[error("{0}")]
    Validation(String),

    /// Errors raised by the entry store.
    ///
    /// This variant uses a dedicated StorageError type to provide the path
    /// and the underlying cause of the failed filesystem operation.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A background storage task stopped without delivering its result.
    #[error("Background task failed: {0}")]
    Task(String),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use daybook::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Validation("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;
