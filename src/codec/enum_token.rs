//! Enum token normalizer.
//!
//! Enum members cross the interchange boundary as their symbolic name, not
//! their display value (`Main`, not `Main Story`). Imports also accept
//! display values, case variants and the external editor's placeholder
//! names (`NewEnumerator3`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{EnumKind, EnumMember, Value};

/// Placeholder names generated by the external authoring tool.
static PLACEHOLDER_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^NewEnumerator(\d+)$").ok());

/// Outcome of resolving an imported enum token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumResolution {
    /// The token named a member.
    Resolved(EnumMember),
    /// Nothing matched; carries the raw token for error reporting.
    Unresolved(String),
}

impl EnumResolution {
    /// Returns the member, if resolved.
    #[must_use]
    pub const fn member(&self) -> Option<EnumMember> {
        match self {
            Self::Resolved(member) => Some(*member),
            Self::Unresolved(_) => None,
        }
    }
}

/// Returns the portable token for a member.
#[must_use]
pub fn to_token(member: EnumMember) -> &'static str {
    member.token()
}

/// Resolves an imported token against an enumeration.
///
/// Tried in order: exact display value, case-insensitive symbolic name (with
/// or without the reserved-word underscore) or display value, then the
/// `NewEnumeratorN` placeholder as the Nth declared member.
#[must_use]
pub fn from_token(kind: EnumKind, raw: &str) -> EnumResolution {
    let token = raw.trim();

    if let Some(member) = kind.members().find(|m| m.value() == token) {
        return EnumResolution::Resolved(member);
    }

    if let Some(member) = kind.members().find(|m| {
        m.name().eq_ignore_ascii_case(token)
            || m.token().eq_ignore_ascii_case(token)
            || m.value().eq_ignore_ascii_case(token)
    }) {
        return EnumResolution::Resolved(member);
    }

    if let Some(member) = placeholder_index(token).and_then(|index| kind.nth(index)) {
        return EnumResolution::Resolved(member);
    }

    EnumResolution::Unresolved(raw.to_string())
}

fn placeholder_index(token: &str) -> Option<usize> {
    PLACEHOLDER_PATTERN
        .as_ref()?
        .captures(token)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Normalizes a stored enum-field value for export.
///
/// Stored display values and names become [`Value::Enum`]; values that name
/// no member are returned unchanged so the export can still proceed.
#[must_use]
pub fn normalize_for_export(kind: EnumKind, value: Value) -> Value {
    match value {
        Value::Str(text) => match from_token(kind, &text) {
            EnumResolution::Resolved(member) => Value::Enum(member),
            EnumResolution::Unresolved(_) => Value::Str(text),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_for_export(kind, item))
                .collect(),
        ),
        other => other,
    }
}
