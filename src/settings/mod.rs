//! Settings nodes and the field table the merge engine walks.
//!
//! A settings node is a plain struct whose fields are all `Option<T>`: `None`
//! means "this layer did not supply a value", which is distinct from an empty
//! string or zero. The [`settings!`](crate::settings) macro declares such a
//! struct and generates its [`Settings`] and [`Merge`] impls.

mod merge;

pub use merge::{merge_nested, merge_scalar, override_settings, Merge};

/// How the merge engine treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A leaf value. Present incoming values overwrite the base.
    Scalar(ScalarKind),
    /// Another settings node, merged recursively. Carries the nested field table.
    Nested(&'static [FieldInfo]),
}

/// The textual shape of a scalar, used when binding flat string sources such as
/// environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Taken verbatim.
    Text,
    Bool,
    /// A signed 64-bit integer, the widest integer the TOML data model holds.
    /// Unsigned values above `i64::MAX` cannot be bound.
    Integer,
    Float,
    /// Comma-separated strings.
    TextList,
    /// Comma-separated values, each coerced like [`ScalarKind::Any`].
    List,
    /// Coerced to the most specific of bool, integer, float or string.
    Any,
}

/// Name and classification of one field of a settings node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldInfo {
    pub fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Nested(_))
    }

    /// Finds the field called `name` in a field table, ignoring ASCII case.
    pub fn find(fields: &'static [FieldInfo], name: &str) -> Option<&'static FieldInfo> {
        fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }
}

/// A typed node of the configuration tree.
///
/// `Default` must produce the instance used when a nested field is absent on
/// the base but present on an incoming layer. Deriving it yields an all-absent
/// node; a hand-written impl can carry domain defaults instead.
///
/// Implement this with [`settings!`](crate::settings) rather than by hand.
pub trait Settings: Default + Sized {
    /// Every field of the node, in declaration order.
    const FIELDS: &'static [FieldInfo];

    /// Merges every present field of `incoming` into `self`.
    fn merge_fields(&mut self, incoming: Self);

    /// Names of the fields this instance sets.
    fn present_fields(&self) -> Vec<&'static str>;

    /// Looks up a field by name, ignoring ASCII case.
    fn field(name: &str) -> Option<&'static FieldInfo> {
        FieldInfo::find(Self::FIELDS, name)
    }

    /// Returns `self` with every field `incoming` sets taking precedence.
    ///
    /// Consumes the base; the returned value is the only authoritative result.
    /// An absent `incoming` returns `self` unchanged.
    fn override_with(mut self, incoming: Option<Self>) -> Self {
        if let Some(incoming) = incoming {
            self.merge_fields(incoming);
        }
        self
    }
}

/// Declares a settings node.
///
/// Each field is written with its value type and stored as `Option` of that
/// type. Attributes on the struct and on fields are passed through, so serde
/// derives and `#[serde(...)]` field attributes work as usual. Field names are
/// also the keys used for environment binding, so they should not be renamed
/// through serde.
///
/// ```
/// use serde::Deserialize;
/// use settings_overlay::{settings, Settings};
///
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
///         pub name: String,
///         pub database: Database,
///     }
/// }
///
/// let base = App {
///     name: Some("demo".into()),
///     database: Some(Database { host: Some("localhost".into()), port: None }),
/// };
/// let incoming = App {
///     name: None,
///     database: Some(Database { host: None, port: Some(5432) }),
/// };
///
/// let merged = base.override_with(Some(incoming));
/// assert_eq!(merged.name.as_deref(), Some("demo"));
/// let database = merged.database.unwrap();
/// assert_eq!(database.host.as_deref(), Some("localhost"));
/// assert_eq!(database.port, Some(5432));
/// ```
#[macro_export]
macro_rules! settings {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: ::core::option::Option<$ty>,
            )*
        }

        impl $crate::Settings for $name {
            const FIELDS: &'static [$crate::FieldInfo] = &[
                $(
                    $crate::FieldInfo {
                        name: ::core::stringify!($field),
                        kind: <$ty as $crate::Merge>::KIND,
                    },
                )*
            ];

            #[allow(unused_variables)]
            fn merge_fields(&mut self, incoming: Self) {
                $(
                    <$ty as $crate::Merge>::merge_into(&mut self.$field, incoming.$field);
                )*
            }

            #[allow(unused_mut)]
            fn present_fields(&self) -> ::std::vec::Vec<&'static str> {
                let mut present = ::std::vec::Vec::new();
                $(
                    if self.$field.is_some() {
                        present.push(::core::stringify!($field));
                    }
                )*
                present
            }
        }

        impl $crate::Merge for $name {
            const KIND: $crate::FieldKind =
                $crate::FieldKind::Nested(<$name as $crate::Settings>::FIELDS);

            fn merge_into(
                slot: &mut ::core::option::Option<Self>,
                incoming: ::core::option::Option<Self>,
            ) {
                $crate::merge_nested(slot, incoming);
            }
        }
    };
}

/// Registers types as scalar settings fields.
///
/// ```
/// use serde::Deserialize;
/// use settings_overlay::{impl_scalar, settings, FieldKind, ScalarKind, Settings};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
/// #[serde(rename_all = "lowercase")]
/// pub enum Level {
///     Debug,
///     Info,
/// }
///
/// impl_scalar!(Text => Level);
///
/// settings! {
///     #[derive(Debug, Default, Deserialize)]
///     pub struct Logging {
///         pub level: Level,
///     }
/// }
///
/// assert_eq!(Logging::FIELDS[0].kind, FieldKind::Scalar(ScalarKind::Text));
/// ```
#[macro_export]
macro_rules! impl_scalar {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Merge for $ty {
                const KIND: $crate::FieldKind =
                    $crate::FieldKind::Scalar($crate::ScalarKind::$kind);

                fn merge_into(
                    slot: &mut ::core::option::Option<Self>,
                    incoming: ::core::option::Option<Self>,
                ) {
                    $crate::merge_scalar(slot, incoming);
                }
            }
        )+
    };
}
