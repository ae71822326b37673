use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required settings file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode settings from {origin}: {source}")]
    Decode {
        origin: String,
        source: DecodeError,
    },

    #[error("environment variable {var}={value:?} is not a valid {expected}")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: &'static str,
    },
}

/// Failure to parse serialized text into a settings node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
