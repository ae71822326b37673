use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, debug_span};

use super::embedded::{EmbeddedSource, ResourceReader};
use super::env::EnvSource;
use super::file::FileSource;
use super::source::{Source, ValueSource};
use super::ConfigError;
use crate::snapshot::Snapshot;
use crate::Settings;

/// Builder for layering settings from multiple sources.
///
/// Starts from a base instance and applies each registered source in
/// registration order, later sources overriding earlier ones field by field.
/// Nested settings merge recursively; scalars (including lists) are replaced.
/// A source that is not present leaves the result untouched.
///
/// ## Example
///
/// ```no_run
/// use serde::Deserialize;
/// use settings_overlay::config::Bundle;
/// use settings_overlay::{settings, SettingsBuilder};
///
/// settings! {
///     #[derive(Debug, Default, Clone, Deserialize)]
///     pub struct Farm {
///         pub name: String,
///         pub location: String,
///     }
/// }
///
/// static ASSETS: Bundle = Bundle::new("farm", &[("baseline.toml", "location = \"us-west\"")]);
///
/// let defaults = Farm {
///     name: Some("default-farm".into()),
///     location: Some("unset".into()),
/// };
///
/// // defaults -> embedded baseline -> settings file -> FARM__* variables
/// let farm: Farm = SettingsBuilder::from_base(defaults)
///     .with_embedded(Some(ASSETS), "baseline.toml")
///     .with_optional_file(std::env::var("FARM_SETTINGS").ok())
///     .with_env("FARM", "__")
///     .build()?;
/// # Ok::<(), settings_overlay::ConfigError>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct SettingsBuilder<T> {
    base: T,
    sources: Vec<Box<dyn Source<T>>>,
}

impl<T: Settings> Default for SettingsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SettingsBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsBuilder")
            .field("base", &self.base)
            .field("sources", &self.sources)
            .finish()
    }
}

impl<T: Settings> SettingsBuilder<T> {
    /// Starts from `T::default()`.
    pub fn new() -> Self {
        Self::from_base(T::default())
    }

    /// Starts from an explicit base instance, typically compiled-in defaults.
    pub fn from_base(base: T) -> Self {
        Self {
            base,
            sources: Vec::new(),
        }
    }

    /// Adds any source. Sources are applied in registration order.
    pub fn with_source(mut self, source: impl Source<T> + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Builds the settings by loading each source and merging it on top of the
    /// running result.
    ///
    /// The first failing source aborts the build; nothing it produced is
    /// merged.
    pub fn build(self) -> Result<T, ConfigError> {
        let mut merged = self.base;

        for source in &self.sources {
            let name = source.describe();
            let _span = debug_span!("settings_layer", source = %name).entered();

            match source.load()? {
                Some(layer) => {
                    debug!(fields = ?layer.present_fields(), "applying settings layer");
                    merged = merged.override_with(Some(layer));
                }
                None => debug!("settings source absent, skipping"),
            }
        }

        Ok(merged)
    }

    /// Builds the settings and freezes them into a shareable [`Snapshot`].
    pub fn build_snapshot(self) -> Result<Snapshot<T>, ConfigError> {
        self.build().map(Snapshot::new)
    }
}

impl<T> SettingsBuilder<T>
where
    T: Settings + Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Adds an in-memory layer.
    pub fn with_value(self, label: impl Into<String>, layer: T) -> Self {
        self.with_source(ValueSource::new(label, layer))
    }
}

impl<T> SettingsBuilder<T>
where
    T: Settings + DeserializeOwned + 'static,
{
    /// Adds a resource from an embedded bundle. A `None` bundle or a missing
    /// resource is skipped.
    pub fn with_embedded<R>(self, bundle: Option<R>, name: impl Into<String>) -> Self
    where
        R: ResourceReader + 'static,
    {
        self.with_source(EmbeddedSource::new(bundle, name))
    }

    /// Adds a TOML or JSON file, chosen by extension.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds an optional file whose path may not be configured at all.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: Option<P>) -> Self {
        self.with_source(FileSource::optional(path))
    }

    /// Loads settings from process environment variables.
    ///
    /// Variable names are mapped to field paths by:
    /// 1. Removing the prefix and separator (an empty prefix keeps every variable)
    /// 2. Splitting remaining segments on the separator
    /// 3. Matching each segment against field names, ignoring ASCII case
    ///
    /// ```no_run
    /// # use serde::Deserialize;
    /// # use settings_overlay::{settings, SettingsBuilder};
    /// settings! {
    ///     #[derive(Debug, Default, Deserialize)]
    ///     pub struct Database {
    ///         pub host: String,
    ///         pub port: u16,
    ///     }
    /// }
    ///
    /// settings! {
    ///     #[derive(Debug, Default, Deserialize)]
    ///     pub struct App {
    ///         pub database: Database,
    ///     }
    /// }
    ///
    /// // With MYAPP__DATABASE__HOST=localhost and MYAPP__DATABASE__PORT=5432
    /// let app: App = SettingsBuilder::new()
    ///     .with_file("config/default.toml", true)
    ///     .with_env("MYAPP", "__")
    ///     .build()?;
    /// # Ok::<(), settings_overlay::ConfigError>(())
    /// ```
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bundle, Format};
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    crate::settings! {
        #[derive(Debug, Default, Clone, Deserialize, PartialEq)]
        struct Farm {
            name: String,
            location: String,
        }
    }

    static ASSETS: Bundle = Bundle::new("farm", &[("baseline.toml", "location = \"us-west\"")]);

    fn farm(name: &str, location: &str) -> Farm {
        Farm {
            name: Some(name.into()),
            location: Some(location.into()),
        }
    }

    fn env(pairs: &[(&str, &str)]) -> EnvSource<Vec<(String, String)>> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvSource::with_env("FARM", "__", vars)
    }

    fn settings_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_build_without_sources_returns_base() {
        let farm_settings = SettingsBuilder::from_base(farm("a", "b")).build().unwrap();
        assert_eq!(farm_settings, farm("a", "b"));

        let empty: Farm = SettingsBuilder::new().build().unwrap();
        assert_eq!(empty, Farm::default());
    }

    #[test]
    fn test_layers_apply_in_order() {
        let file = settings_file("name = \"prod-farm\"");

        let result = SettingsBuilder::from_base(farm("default-farm", "unset"))
            .with_embedded(Some(ASSETS), "baseline.toml")
            .with_file(file.path(), true)
            .with_source(env(&[("FARM__LOCATION", "us-east")]))
            .build()
            .unwrap();

        assert_eq!(result, farm("prod-farm", "us-east"));
    }

    #[test]
    fn test_later_layer_wins() {
        let result = SettingsBuilder::new()
            .with_value("first", farm("one", "east"))
            .with_value(
                "second",
                Farm {
                    name: Some("two".into()),
                    location: None,
                },
            )
            .build()
            .unwrap();

        assert_eq!(result, farm("two", "east"));
    }

    #[test]
    fn test_absent_file_is_same_as_no_file() {
        let with_missing = SettingsBuilder::from_base(farm("default-farm", "unset"))
            .with_embedded(Some(ASSETS), "baseline.toml")
            .with_file("/nonexistent/farm.toml", false)
            .with_optional_file(None::<&str>)
            .with_source(env(&[("FARM__NAME", "env-farm")]))
            .build()
            .unwrap();

        let without = SettingsBuilder::from_base(farm("default-farm", "unset"))
            .with_embedded(Some(ASSETS), "baseline.toml")
            .with_source(env(&[("FARM__NAME", "env-farm")]))
            .build()
            .unwrap();

        assert_eq!(with_missing, without);
        assert_eq!(with_missing, farm("env-farm", "us-west"));
    }

    #[test]
    fn test_decode_error_aborts_build() {
        let file = settings_file("{ \"name\": ");

        let result = SettingsBuilder::from_base(farm("default-farm", "unset"))
            .with_source(FileSource::new(file.path(), true).format(Format::Json))
            .with_source(env(&[("FARM__NAME", "env-farm")]))
            .build();

        match result {
            Err(ConfigError::Decode { origin, .. }) => {
                assert_eq!(origin, file.path().display().to_string());
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_required_file_missing_aborts_build() {
        let result = SettingsBuilder::<Farm>::new()
            .with_file("/nonexistent/farm.toml", true)
            .build();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_build_snapshot() {
        let snapshot = SettingsBuilder::from_base(farm("a", "b"))
            .build_snapshot()
            .unwrap();

        assert_eq!(snapshot.name.as_deref(), Some("a"));
        assert_eq!(*snapshot, farm("a", "b"));
    }
}
