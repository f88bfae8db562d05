//! Row key resolver.
//!
//! Every exported record gets an external key that is unique within its
//! batch. Keys come from the first source that yields a non-empty token:
//!
//! 1. the record's `slug`, for kinds that declare one;
//! 2. the kind's composite template, joined with [`COMPOSITE_JOINER`];
//! 3. `slugName`, `name` or `title`;
//! 4. any other populated scalar (by field name), then foreign keys, then `id`.
//!
//! Collisions get `_2`, `_3`, ... in batch order. Tokens never contain `_`,
//! so a suffix is always distinguishable from the base.

use std::collections::HashSet;

use super::slug::{FALLBACK_TOKEN, slugify};
use crate::models::{
    ALIAS_SUFFIX, EntityKind, ID_FIELD, Record, SLUG_FIELD, field_text, is_foreign_key,
};

/// Separator between composite template parts.
pub const COMPOSITE_JOINER: &str = "__";

/// Descriptive fields tried after slugs and composite templates.
pub const NAME_FIELDS: [&str; 3] = ["slugName", "name", "title"];

/// Assigns batch-unique row keys.
///
/// One resolver lives for exactly one export batch.
#[derive(Debug, Default)]
pub struct RowKeyResolver {
    used: HashSet<String>,
}

impl RowKeyResolver {
    /// Creates a resolver with an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and claims the row key for the next record in the batch.
    pub fn resolve(&mut self, kind: EntityKind, record: &Record) -> String {
        self.claim(base_key(kind, record))
    }

    /// Number of keys claimed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Returns true if no key has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut suffix = 2_usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Computes the undeduplicated key for a record.
#[must_use]
pub fn base_key(kind: EntityKind, record: &Record) -> String {
    let descriptor = kind.descriptor();

    if descriptor.has_slug {
        if let Some(token) = token_of(record, SLUG_FIELD) {
            return token;
        }
    }

    let parts: Vec<String> = descriptor
        .composite_key
        .iter()
        .filter_map(|field| token_of(record, field))
        .collect();
    if !parts.is_empty() {
        return parts.join(COMPOSITE_JOINER);
    }

    if let Some(token) = NAME_FIELDS.iter().find_map(|field| token_of(record, field)) {
        return token;
    }

    fallback_key(record).unwrap_or_else(|| FALLBACK_TOKEN.to_string())
}

fn fallback_key(record: &Record) -> Option<String> {
    let mut descriptive: Vec<&str> = Vec::new();
    let mut relationships: Vec<&str> = Vec::new();

    for (field, value) in record {
        if !value.is_scalar() || is_identifier(field) {
            continue;
        }
        if is_relationship(field) {
            relationships.push(field);
        } else {
            descriptive.push(field);
        }
    }
    descriptive.sort_unstable();
    relationships.sort_unstable();

    descriptive
        .into_iter()
        .chain(relationships)
        .chain(std::iter::once(ID_FIELD))
        .find_map(|field| token_of(record, field))
}

fn is_identifier(field: &str) -> bool {
    field == ID_FIELD || field == SLUG_FIELD || NAME_FIELDS.contains(&field)
}

fn is_relationship(field: &str) -> bool {
    is_foreign_key(field) || field.ends_with(ALIAS_SUFFIX)
}

fn token_of(record: &Record, field: &str) -> Option<String> {
    field_text(record, field)
        .map(|text| slugify(&text))
        .filter(|token| !token.is_empty())
}
