//! Frozen settings shared across the application.

use std::ops::Deref;
use std::sync::Arc;

/// The fully merged settings, frozen for read-only use.
///
/// Cloning is cheap and every clone sees the same value, so one snapshot can
/// be handed to any number of threads once startup has built it.
///
/// ## Example
///
/// ```
/// use serde::Deserialize;
/// use settings_overlay::{settings, SettingsBuilder};
///
/// settings! {
///     #[derive(Debug, Default, Clone, Deserialize)]
///     pub struct Farm {
///         pub name: String,
///     }
/// }
///
/// let snapshot = SettingsBuilder::new()
///     .with_value("defaults", Farm { name: Some("demo".into()) })
///     .build_snapshot()?;
///
/// let shared = snapshot.clone();
/// std::thread::spawn(move || assert_eq!(shared.name.as_deref(), Some("demo")))
///     .join()
///     .unwrap();
/// # Ok::<(), settings_overlay::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Snapshot<T> {
    settings: Arc<T>,
}

impl<T> Snapshot<T> {
    pub fn new(settings: T) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// Returns a reference to the settings.
    pub fn settings(&self) -> &T {
        &self.settings
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.settings
    }
}

impl<T> AsRef<T> for Snapshot<T> {
    fn as_ref(&self) -> &T {
        &self.settings
    }
}
