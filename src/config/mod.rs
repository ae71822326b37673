//! Settings sources and the layering pipeline.

mod builder;
mod embedded;
mod env;
mod error;
mod file;
mod format;
mod source;

pub use builder::SettingsBuilder;
pub use embedded::{Bundle, EmbeddedSource, ResourceReader};
pub use env::{EnvSource, Environment, ProcessEnv};
pub use error::{ConfigError, DecodeError};
pub use file::{FileReader, FileSource, FsReader};
pub use format::Format;
pub use source::{Source, ValueSource};
