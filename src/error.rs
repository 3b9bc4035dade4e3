use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading a manifest or model source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest or output YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Manifest or output JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A Rust model source could not be parsed
    #[error("parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    /// A type name in the manifest is malformed
    #[error("invalid type name `{name}`: {reason}")]
    InvalidType { name: String, reason: String },

    /// No compiled route is registered for the method
    #[error("no route registered for `{0}`")]
    RouteNotFound(String),

    /// Invalid reader configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_type(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
