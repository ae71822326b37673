//! Layered settings construction.
//!
//! A typed settings struct is built by merging layers on top of a base:
//! compiled-in defaults, an embedded baseline, an optional file and
//! environment variables. Every field is an `Option`; a layer overrides only
//! the fields it sets, and nested settings merge field by field.

pub mod config;
pub mod settings;
pub mod snapshot;

pub use config::{ConfigError, SettingsBuilder};
pub use settings::{
    merge_nested, merge_scalar, override_settings, FieldInfo, FieldKind, Merge, ScalarKind,
    Settings,
};
pub use snapshot::Snapshot;
