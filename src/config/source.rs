use std::fmt;

use super::ConfigError;

/// One layer of the settings pipeline.
///
/// `load` returns `Ok(None)` when the source is simply not there (missing
/// file, no matching environment variables) and an error only for content it
/// tried and failed to decode.
pub trait Source<T>: Send + Sync + fmt::Debug {
    /// Human-readable name used in logs and errors.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Option<T>, ConfigError>;
}

/// A layer supplied directly as a value, e.g. compiled-in defaults.
#[derive(Debug, Clone)]
pub struct ValueSource<T> {
    label: String,
    value: T,
}

impl<T> ValueSource<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<T> Source<T> for ValueSource<T>
where
    T: Clone + Send + Sync + fmt::Debug,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> Result<Option<T>, ConfigError> {
        Ok(Some(self.value.clone()))
    }
}
