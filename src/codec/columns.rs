//! Column planner.

use indexmap::IndexSet;

use crate::models::{EntityKind, ID_FIELD, Record, SLUG_FIELD, Schema};
use crate::{Error, Result};

/// Columns pinned directly after the row-key column, when present.
const LEADING_COLUMNS: [&str; 3] = [ID_FIELD, SLUG_FIELD, "slugName"];

/// Plans the ordered column list for one export batch.
///
/// Declared schema fields come first in declaration order, followed by any
/// field observed in the batch (first seen, scanning records in order).
/// Storage-only payload fields of the kind are never planned. The row-key
/// column is forced to the front, then `id`, `slug` and `slugName`.
#[must_use]
pub fn plan_columns(
    kind: EntityKind,
    schema: &Schema,
    records: &[Record],
    row_key_header: &str,
) -> Vec<String> {
    let descriptor = kind.descriptor();
    let mut planned: IndexSet<&str> = IndexSet::new();

    let observed = records.iter().flat_map(|record| record.keys().map(String::as_str));
    for field in schema.fields().map(|(name, _)| name).chain(observed) {
        if field != row_key_header && !descriptor.is_internal(field) {
            planned.insert(field);
        }
    }

    let mut columns = Vec::with_capacity(planned.len() + 1);
    columns.push(row_key_header.to_string());
    for leading in LEADING_COLUMNS {
        if planned.shift_remove(leading) {
            columns.push(leading.to_string());
        }
    }
    columns.extend(planned.into_iter().map(str::to_string));
    columns
}

/// Drops the injected alias columns the schema does not declare.
///
/// Runs last, after row keys have consumed the aliases. Stored fields that
/// merely look like aliases are kept.
#[must_use]
pub fn strip_transient_aliases(
    columns: Vec<String>,
    schema: &Schema,
    injected: &IndexSet<String>,
) -> Vec<String> {
    columns
        .into_iter()
        .filter(|column| !injected.contains(column) || schema.declares(column))
        .collect()
}

/// Checks that the row-key header cannot shadow a real column.
///
/// The header must be non-empty, must not be `id`, `slug` or `slugName`,
/// and must not be declared by any of the given schemas.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the clash.
pub fn check_row_key_header<'a>(
    header: &str,
    schemas: impl IntoIterator<Item = &'a Schema>,
) -> Result<()> {
    if header.trim().is_empty() {
        return Err(Error::InvalidInput(
            "row_key_header must not be empty".to_string(),
        ));
    }
    if LEADING_COLUMNS.iter().any(|reserved| *reserved == header) {
        return Err(Error::InvalidInput(format!(
            "row_key_header '{header}' is a reserved field name"
        )));
    }
    if let Some(schema) = schemas.into_iter().find(|schema| schema.declares(header)) {
        return Err(Error::InvalidInput(format!(
            "row_key_header '{header}' is a declared field of {}",
            schema.kind()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldType, Value};

    fn record(fields: &[&str]) -> Record {
        fields
            .iter()
            .map(|f| ((*f).to_string(), Value::from("x")))
            .collect()
    }

    #[test]
    fn test_declared_then_observed_with_pinned_head() {
        let schema = Schema::new(EntityKind::Items)
            .with_field("name", FieldType::String, true)
            .with_field("slug", FieldType::String, true)
            .with_field("id", FieldType::String, true)
            .with_field("rarity", FieldType::String, false);
        let records = vec![
            record(&["id", "legacy", "name"]),
            record(&["zeta", "slugName", "legacy"]),
        ];

        let columns = plan_columns(EntityKind::Items, &schema, &records, "---");
        assert_eq!(
            columns,
            vec!["---", "id", "slug", "slugName", "name", "rarity", "legacy", "zeta"]
        );
    }

    #[test]
    fn test_internal_payloads_are_never_planned() {
        let schema = Schema::new(EntityKind::Abilities).with_field("id", FieldType::String, true);
        let records = vec![record(&["id", "effects", "scaling", "cooldown"])];
        let columns = plan_columns(EntityKind::Abilities, &schema, &records, "---");
        assert_eq!(columns, vec!["---", "id", "cooldown"]);
    }

    #[test]
    fn test_row_key_header_is_not_duplicated() {
        let schema = Schema::new(EntityKind::Stats);
        let records = vec![record(&["Name", "id"])];
        let columns = plan_columns(EntityKind::Stats, &schema, &records, "Name");
        assert_eq!(columns, vec!["Name", "id"]);
    }

    #[test]
    fn test_strip_undeclared_aliases() {
        let schema = Schema::new(EntityKind::AbilityEffectLinks)
            .with_field("id", FieldType::String, true)
            .with_field("effect_slug", FieldType::String, false);
        let columns = vec![
            "---".to_string(),
            "id".to_string(),
            "slug".to_string(),
            "ability_slug".to_string(),
            "effect_slug".to_string(),
            "legacy_slug".to_string(),
        ];
        let injected: IndexSet<String> = ["ability_slug", "effect_slug"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(
            strip_transient_aliases(columns, &schema, &injected),
            vec!["---", "id", "slug", "effect_slug", "legacy_slug"]
        );
    }

    #[test]
    fn test_row_key_header_must_not_shadow_fields() {
        let schema = Schema::new(EntityKind::Timelines)
            .with_field("id", FieldType::String, true)
            .with_field("name", FieldType::String, true);

        assert!(check_row_key_header("---", [&schema]).is_ok());
        assert!(check_row_key_header("Name", [&schema]).is_ok());
        for header in ["", "  ", "id", "slug", "slugName", "name"] {
            let err = check_row_key_header(header, [&schema]).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "accepted {header:?}");
        }
    }
}
