//! Dynamically typed record values.

use indexmap::IndexMap;
use serde_json::Number;
use std::fmt;

use super::enums::EnumMember;

/// Ordered field map used for both records and nested structs.
pub type Fields = IndexMap<String, Value>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or empty.
    #[default]
    Null,
    /// Text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// A resolved member of a declared enumeration.
    Enum(EnumMember),
    /// Ordered list of values.
    Array(Vec<Self>),
    /// Nested key/value structure.
    Struct(Fields),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for values that are not arrays or structs.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Struct(_))
    }

    /// Returns the text of a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true when the value carries something worth naming a row after.
    ///
    /// Null, whitespace-only strings and empty containers are unpopulated.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Str(s) => !s.trim().is_empty(),
            Self::Array(items) => !items.is_empty(),
            Self::Struct(fields) => !fields.is_empty(),
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Enum(_) => true,
        }
    }

    /// Plain display text for scalars.
    ///
    /// Enum members render as their portable token. Containers return `None`;
    /// they go through the property-text encoder instead.
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_float(*f)),
            Self::Bool(b) => Some(b.to_string()),
            Self::Enum(member) => Some(member.token().to_string()),
            Self::Array(_) | Self::Struct(_) => None,
        }
    }

    /// Converts a JSON value into a [`Value`].
    ///
    /// Numbers that fit in `i64` become [`Value::Int`].
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            },
            serde_json::Value::Object(map) => Self::Struct(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts into JSON for persistence.
    ///
    /// Enum members persist as their display value; non-finite floats as null.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(i) => serde_json::Value::Number((*i).into()),
            Self::Float(f) => {
                Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            },
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Enum(member) => serde_json::Value::String(member.value().to_string()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Struct(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Formats a float so it never reads back as an integer.
///
/// `Debug` keeps a trailing `.0` for whole numbers (`1.0`, `1e21`).
#[must_use]
pub fn format_float(f: f64) -> String {
    format!("{f:?}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scalar_text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<EnumMember> for Value {
    fn from(member: EnumMember) -> Self {
        Self::Enum(member)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
