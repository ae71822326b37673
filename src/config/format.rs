//! Decoding serialized text into settings nodes.

use std::path::Path;

use serde::de::DeserializeOwned;

use super::error::DecodeError;
use super::ConfigError;

/// Serialized text format of a file or embedded resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Toml,
    Json,
}

impl Format {
    /// Picks the format from a path's extension: `.json` is JSON, anything
    /// else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }

    /// Decodes `text` into `T`. Keys missing from the text decode to `None`,
    /// as does a JSON `null`.
    pub fn decode<T: DeserializeOwned>(self, text: &str) -> Result<T, DecodeError> {
        match self {
            Format::Toml => Ok(toml::from_str(text)?),
            Format::Json => Ok(serde_json::from_str(text)?),
        }
    }

    /// Decodes one layer read from `origin`.
    ///
    /// Blank text is an absent layer rather than a decode error.
    pub(crate) fn decode_layer<T: DeserializeOwned>(
        self,
        text: &str,
        origin: impl Into<String>,
    ) -> Result<Option<T>, ConfigError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.decode(text)
            .map(Some)
            .map_err(|source| ConfigError::Decode {
                origin: origin.into(),
                source,
            })
    }
}
