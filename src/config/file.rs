//! File-based settings source.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::format::Format;
use super::source::Source;
use super::ConfigError;
use crate::Settings;

/// Reads the text of a settings file.
pub trait FileReader: Send + Sync + fmt::Debug {
    /// Returns `Ok(None)` when nothing exists at `path`.
    fn read_file(&self, path: &Path) -> io::Result<Option<String>>;
}

/// [`FileReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read_file(&self, path: &Path) -> io::Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A settings source that loads one TOML or JSON file.
///
/// Files can be marked as required or optional. Required files that don't
/// exist cause an error; optional files that don't exist are skipped. A path
/// that is unset or blank is always skipped.
#[derive(Debug, Clone)]
pub struct FileSource<R = FsReader> {
    path: Option<PathBuf>,
    format: Option<Format>,
    required: bool,
    reader: R,
}

impl FileSource {
    /// Creates a file source reading from the local filesystem.
    ///
    /// If `required` is true, loading fails if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self::with_reader(Some(path), required, FsReader)
    }

    /// Creates an optional file source from a path that may not be configured.
    pub fn optional<P: AsRef<Path>>(path: Option<P>) -> Self {
        Self::with_reader(path, false, FsReader)
    }
}

impl<R: FileReader> FileSource<R> {
    pub fn with_reader<P: AsRef<Path>>(path: Option<P>, required: bool, reader: R) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            format: None,
            required,
            reader,
        }
    }

    /// Overrides the format otherwise inferred from the file extension.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    fn configured_path(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .filter(|path| !path.to_string_lossy().trim().is_empty())
    }
}

impl<T, R> Source<T> for FileSource<R>
where
    T: Settings + DeserializeOwned,
    R: FileReader,
{
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("file '{}'", path.display()),
            None => "file (no path)".to_string(),
        }
    }

    fn load(&self) -> Result<Option<T>, ConfigError> {
        let Some(path) = self.configured_path() else {
            trace!("no settings file path configured");
            return Ok(None);
        };

        let contents = self
            .reader
            .read_file(path)
            .map_err(|source| ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            })?;

        match contents {
            Some(text) => {
                let format = self.format.unwrap_or_else(|| Format::from_path(path));
                debug!(path = %path.display(), ?format, "decoding settings file");
                format.decode_layer(&text, path.display().to_string())
            }
            None if self.required => Err(ConfigError::FileNotFound(path.to_path_buf())),
            None => {
                debug!(path = %path.display(), "optional settings file not found");
                Ok(None)
            }
        }
    }
}
