use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::{debug, trace};

use super::error::DecodeError;
use super::source::Source;
use super::ConfigError;
use crate::{FieldInfo, FieldKind, ScalarKind, Settings};

/// A snapshot of environment variables.
pub trait Environment: Send + Sync + fmt::Debug {
    fn vars(&self) -> Vec<(String, String)>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

impl Environment for HashMap<String, String> {
    fn vars(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Environment for BTreeMap<String, String> {
    fn vars(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Environment for Vec<(String, String)> {
    fn vars(&self) -> Vec<(String, String)> {
        self.clone()
    }
}

/// Binds environment variables onto the fields of a settings node.
///
/// A variable named `PREFIX{sep}SECTION{sep}FIELD` addresses the nested field
/// `section.field`. Segments match field names ignoring ASCII case. With an
/// empty prefix every variable is considered. Variables that don't address a
/// scalar field are ignored, and values are converted according to the
/// field's [`ScalarKind`].
///
/// The separator splits every segment, so with `"_"` a field such as
/// `max_conn` can never be addressed. Use `"__"` when field names contain
/// underscores.
#[derive(Debug, Clone)]
pub struct EnvSource<E = ProcessEnv> {
    prefix: String,
    separator: String,
    env: E,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::with_env(prefix, separator, ProcessEnv)
    }
}

impl<E: Environment> EnvSource<E> {
    pub fn with_env(prefix: impl Into<String>, separator: impl Into<String>, env: E) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
            env,
        }
    }

    /// Splits a variable name into its field path, or `None` if it doesn't
    /// carry the prefix.
    fn path_of<'a>(&self, key: &'a str) -> Option<Vec<&'a str>> {
        let rest = if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(self.prefix.as_str())?
                .strip_prefix(self.separator.as_str())?
        };
        if rest.is_empty() {
            return None;
        }
        Some(rest.split(self.separator.as_str()).collect())
    }

    /// Builds the table of every bound variable, or `None` if nothing bound.
    fn bind(&self, fields: &'static [FieldInfo]) -> Result<Option<Table>, ConfigError> {
        let mut vars = self.env.vars();
        vars.sort();

        let mut table = Table::new();
        for (key, raw) in &vars {
            let Some(path) = self.path_of(key) else {
                continue;
            };
            let Some((names, kind)) = resolve_path(fields, &path) else {
                trace!(var = %key, "environment variable does not address a settings field");
                continue;
            };
            if let Some(value) = convert(kind, key, raw)? {
                trace!(var = %key, path = %names.join("."), "binding environment variable");
                insert_at_path(&mut table, &names, value);
            }
        }

        Ok((!table.is_empty()).then_some(table))
    }
}

impl<T, E> Source<T> for EnvSource<E>
where
    T: Settings + DeserializeOwned,
    E: Environment,
{
    fn describe(&self) -> String {
        if self.prefix.is_empty() {
            "environment".to_string()
        } else {
            format!("environment ({}{})", self.prefix, self.separator)
        }
    }

    fn load(&self) -> Result<Option<T>, ConfigError> {
        let Some(table) = self.bind(T::FIELDS)? else {
            debug!(prefix = %self.prefix, "no environment variables bound");
            return Ok(None);
        };

        Value::Table(table)
            .try_into()
            .map(Some)
            .map_err(|e| ConfigError::Decode {
                origin: Source::<T>::describe(self),
                source: DecodeError::Toml(e),
            })
    }
}

/// Walks `path` through the schema, returning the canonical field names and
/// the scalar kind at its end.
fn resolve_path(
    fields: &'static [FieldInfo],
    path: &[&str],
) -> Option<(Vec<&'static str>, ScalarKind)> {
    let mut names = Vec::with_capacity(path.len());
    let mut fields = fields;

    for (i, segment) in path.iter().enumerate() {
        let field = FieldInfo::find(fields, segment)?;
        names.push(field.name);

        let last = i + 1 == path.len();
        match (field.kind, last) {
            (FieldKind::Scalar(kind), true) => return Some((names, kind)),
            (FieldKind::Nested(nested), false) => fields = nested,
            _ => return None,
        }
    }

    None
}

fn convert(kind: ScalarKind, var: &str, raw: &str) -> Result<Option<Value>, ConfigError> {
    let invalid = |expected| ConfigError::InvalidEnvValue {
        var: var.to_string(),
        value: raw.to_string(),
        expected,
    };

    if kind == ScalarKind::Text {
        return Ok(Some(Value::String(raw.to_string())));
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        ScalarKind::Text => Value::String(raw.to_string()),
        ScalarKind::Bool => parse_bool(trimmed)
            .map(Value::Boolean)
            .ok_or_else(|| invalid("boolean"))?,
        ScalarKind::Integer => match trimmed.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) if trimmed.parse::<u64>().is_ok() => {
                return Err(invalid("integer (values above i64::MAX are not supported)"))
            }
            Err(_) => return Err(invalid("integer")),
        },
        ScalarKind::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid("float"))?,
        ScalarKind::TextList => Value::Array(
            split_list(raw)
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        ScalarKind::List => Value::Array(split_list(raw).map(coerce_value).collect()),
        ScalarKind::Any => coerce_value(raw),
    };

    Ok(Some(value))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn coerce_value(s: &str) -> Value {
    if let Some(b) = parse_bool(s) {
        return Value::Boolean(b);
    }

    // Only if it looks like an integer: optional minus, then digits
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn insert_at_path(table: &mut Table, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        table.insert(first.to_string(), value);
        return;
    }

    if !matches!(table.get(*first), Some(Value::Table(_))) {
        table.insert(first.to_string(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(*first) {
        insert_at_path(nested, rest, value);
    }
}
