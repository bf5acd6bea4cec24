use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors produced by the board model, the value table and configuration loading
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid cell '{input}' (expected 'row,col' with both in 0..3)")]
    InvalidCell { input: String },

    #[error("invalid board '{input}': {reason}")]
    InvalidBoard { input: String, reason: String },

    #[error("failed to {operation} '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("value table '{}' is corrupt: {source}", path.display())]
    CorruptTable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value table: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid decay schedule: {message}")]
    InvalidDecay { message: String },
}

/// Convenience alias for results carrying the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
