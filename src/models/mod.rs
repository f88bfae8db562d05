//! Data models for tablesmith.
//!
//! Records, values, entity kinds, enumerations and declared schemas.

mod enums;
mod kind;
mod schema;
mod value;

pub use enums::{EnumKind, EnumMember};
pub use kind::{
    ALIAS_SUFFIX, EntityKind, FOREIGN_KEY_SUFFIX, KindDescriptor, alias_field, foreign_key_stem,
    is_foreign_key,
};
pub use schema::{FieldSpec, FieldType, Schema, SchemaRegistry};
pub use value::{Fields, Value, format_float};

/// A flat entity instance: ordered field name to value.
pub type Record = Fields;

/// Primary key field present on every record.
pub const ID_FIELD: &str = "id";

/// Human-assigned unique label field.
pub const SLUG_FIELD: &str = "slug";

/// Returns the trimmed, non-empty text of a scalar field.
///
/// Containers and unpopulated values yield `None`.
#[must_use]
pub fn field_text(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .filter(|value| value.is_populated())
        .and_then(Value::scalar_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Returns the record's primary key, if populated.
#[must_use]
pub fn record_id(record: &Record) -> Option<String> {
    field_text(record, ID_FIELD)
}
