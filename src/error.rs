//! Centralized error types for mailnorm.
//!
//! Only structural failures surface to callers. A property or header that
//! is simply missing is `None` at the call site, never an error.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailnorm library.
#[derive(Error, Debug)]
pub enum MailError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// No engine declares the file's extension.
    #[error("Unsupported format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The input cannot be read as a valid container (corrupt or truncated).
    #[error("Cannot read '{path}' as a message container: {reason}")]
    ContainerUnreadable { path: PathBuf, reason: String },

    /// The embedded transport-header blob could not be parsed.
    ///
    /// Absorbed by the MSG engine, which then behaves as if no header existed.
    #[error("Malformed transport header: {0}")]
    MalformedHeader(String),

    /// A legacy body encoding could not be decoded.
    ///
    /// Absorbed by body normalization, which then keeps the raw text.
    #[error("Body decoding failed: {0}")]
    DecodeFailure(String),

    /// An export operation failed.
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    ///
    /// A missing file maps to [`MailError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }

    /// Create a `ContainerUnreadable` variant.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ContainerUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for failures that abort extraction of a file.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedHeader(_) | Self::DecodeFailure(_))
    }
}
