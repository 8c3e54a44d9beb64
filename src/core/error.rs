//! Error types for image-fetcher
//!
//! Every failure a single URL can run into is an [`Error`]. The orchestrator
//! catches them at the per-URL boundary and turns them into an outcome, so
//! only directory bootstrap failures ever reach the caller of a batch.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::hash_index::ContentHash;

/// The safety constraint a response violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Declared content type is not in the allowed image set
    DisallowedType(String),

    /// Response carried no content type at all
    MissingContentType,

    /// URL path ends in an extension outside the allowed set
    DisallowedExtension(String),

    /// Declared or streamed size is above the limit
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DisallowedType(content_type) => {
                write!(f, "content type '{content_type}' is not an allowed image type")
            }
            Violation::MissingContentType => write!(f, "response has no content type"),
            Violation::DisallowedExtension(ext) => {
                write!(f, "file extension '.{ext}' is not an allowed image extension")
            }
            Violation::TooLarge { size, limit } => {
                write!(f, "file is too large ({size} bytes, limit is {limit} bytes)")
            }
        }
    }
}

/// Main error type for image-fetcher operations
#[derive(Debug, Error)]
pub enum Error {
    /// URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    /// Connection failure, timeout or broken body stream
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("HTTP error: {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Response rejected by the safety validator
    #[error("Unsafe content: {0}")]
    UnsafeContent(Violation),

    /// Content is already present in the target directory
    #[error("Duplicate content {hash} (already stored as {})", .existing.display())]
    Duplicate { hash: ContentHash, existing: PathBuf },

    /// Directory creation or file write failure
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification matching the per-URL terminal states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    UnsafeContent,
    Duplicate,
    Filesystem,
}

impl Error {
    /// Classify this error into one of the four reported kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_) | Error::Network(_) | Error::HttpStatus { .. } => {
                ErrorKind::Network
            }
            Error::UnsafeContent(_) => ErrorKind::UnsafeContent,
            Error::Duplicate { .. } => ErrorKind::Duplicate,
            Error::Filesystem { .. } => ErrorKind::Filesystem,
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<Violation> for Error {
    fn from(violation: Violation) -> Self {
        Error::UnsafeContent(violation)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Error::Network(format!("connection failed: {err}"))
        } else {
            Error::Network(err.to_string())
        }
    }
}

/// Convenience result type for image-fetcher operations
pub type Result<T> = std::result::Result<T, Error>;
