//! Error types for arkive.
//!
//! Every variant here is fatal to a backup run. Failures scoped to a single
//! file never surface through this enum; they accumulate as
//! [`FileError`](crate::engine::FileError) records inside the run result.

use thiserror::Error;

/// Main error type for arkive operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rule pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("root directory not found or not a directory: {path}")]
    RootNotFound { path: String },

    #[error("destination is not writable: {path}: {reason}")]
    DestinationUnwritable { path: String, reason: String },

    #[error("a backup targeting {path} is already in progress")]
    DestinationBusy { path: String },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("walk error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("operation cancelled by user")]
    Cancelled,
}

/// Result type alias for arkive operations
pub type Result<T> = std::result::Result<T, Error>;
