//! Settings compiled into the binary.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::format::Format;
use super::source::Source;
use super::ConfigError;
use crate::Settings;

/// Looks up named text resources packaged with the program.
pub trait ResourceReader: Send + Sync + fmt::Debug {
    fn read_resource(&self, name: &str) -> Option<Cow<'static, str>>;
}

impl<R: ResourceReader + ?Sized> ResourceReader for &R {
    fn read_resource(&self, name: &str) -> Option<Cow<'static, str>> {
        (**self).read_resource(name)
    }
}

/// A static table of named resources, usually filled with `include_str!`.
///
/// Resources can be requested by their bare name or qualified with the bundle
/// name, e.g. `app.baseline.toml` in a bundle named `app`.
///
/// ```
/// use settings_overlay::config::{Bundle, ResourceReader};
///
/// static ASSETS: Bundle = Bundle::new("app", &[("baseline.toml", "name = \"demo\"")]);
///
/// assert!(ASSETS.read_resource("baseline.toml").is_some());
/// assert!(ASSETS.read_resource("app.baseline.toml").is_some());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Bundle {
    name: &'static str,
    resources: &'static [(&'static str, &'static str)],
}

impl Bundle {
    pub const fn new(name: &'static str, resources: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, resources }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl ResourceReader for Bundle {
    fn read_resource(&self, name: &str) -> Option<Cow<'static, str>> {
        let bare = name
            .strip_prefix(self.name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);

        self.resources
            .iter()
            .find(|(key, _)| *key == bare || *key == name)
            .map(|(_, contents)| Cow::Borrowed(*contents))
    }
}

/// A settings source reading one resource out of an optional bundle.
///
/// An unavailable bundle or a missing resource is an absent layer.
#[derive(Debug, Clone)]
pub struct EmbeddedSource<R = Bundle> {
    bundle: Option<R>,
    name: String,
    format: Format,
}

impl<R: ResourceReader> EmbeddedSource<R> {
    /// The format is inferred from the resource name's extension.
    pub fn new(bundle: Option<R>, name: impl Into<String>) -> Self {
        let name = name.into();
        let format = Format::from_path(Path::new(&name));
        Self {
            bundle,
            name,
            format,
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

impl<T, R> Source<T> for EmbeddedSource<R>
where
    T: Settings + DeserializeOwned,
    R: ResourceReader,
{
    fn describe(&self) -> String {
        self.origin()
    }

    fn load(&self) -> Result<Option<T>, ConfigError> {
        let Some(bundle) = &self.bundle else {
            debug!(resource = %self.name, "no resource bundle available");
            return Ok(None);
        };

        match bundle.read_resource(&self.name) {
            Some(text) => self.format.decode_layer(&text, self.origin()),
            None => {
                debug!(resource = %self.name, "embedded resource not found");
                Ok(None)
            }
        }
    }
}

impl<R> EmbeddedSource<R> {
    fn origin(&self) -> String {
        format!("embedded resource '{}'", self.name)
    }
}
