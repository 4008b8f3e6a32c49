use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for traversal, content and search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while walking, reading or searching log trees
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Entry '{entry}' not found in archive {archive}")]
    EntryNotFound { archive: PathBuf, entry: String },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Cannot read archive {path}: {message}")]
    ArchiveRead { path: PathBuf, message: String },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn entry_not_found(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::EntryNotFound {
            archive: archive.into(),
            entry: entry.into(),
        }
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn archive_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Maps an I/O failure on `path` to the most specific variant.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// True for both flavours of NotFoundError.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::EntryNotFound { .. })
    }
}
