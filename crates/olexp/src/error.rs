//! Error types for olexp.
//!
//! Synchronization itself never fails: unknown ids and boundary rejections
//! are reported as `None`/`false`. Only the ambient settings layer has real
//! failure modes.

use std::path::PathBuf;

/// Result type alias for olexp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or saving explorer settings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error.
    #[error("Failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("Invalid TOML settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Failed to serialize TOML settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The settings file extension is neither `.json` nor `.toml`.
    #[error("Unsupported settings format for '{path}'")]
    UnsupportedFormat { path: PathBuf },
}

impl Error {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported-format error.
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }
}
