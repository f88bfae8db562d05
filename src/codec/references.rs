//! Reference slug resolver.
//!
//! Foreign-key columns hold opaque ids. For export they get a readable
//! companion alias (`ability_id` → `ability_slug`), looked up once per
//! column per batch and never written back to storage.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::traits::ReferenceIndex;
use crate::Result;
use crate::models::{EntityKind, Record, Value, alias_field, field_text, is_foreign_key};

/// Per foreign-key column: `raw id → slug`.
pub type AliasMap = IndexMap<String, HashMap<String, String>>;

/// Bulk resolver over a [`ReferenceIndex`].
pub struct ReferenceResolver<'a> {
    index: &'a dyn ReferenceIndex,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver backed by the given index.
    #[must_use]
    pub const fn new(index: &'a dyn ReferenceIndex) -> Self {
        Self { index }
    }

    /// Resolves slugs for every foreign-key column in the batch.
    ///
    /// Columns are visited in first-seen order. Columns whose target kind
    /// is unknown or has no slug are skipped, as are ids with no slug.
    ///
    /// # Errors
    ///
    /// Returns an error if a bulk lookup fails.
    #[instrument(skip(self, records), fields(kind = %kind, records = records.len()))]
    pub fn resolve_aliases(&self, kind: EntityKind, records: &[Record]) -> Result<AliasMap> {
        let mut columns: IndexMap<&str, IndexSet<String>> = IndexMap::new();
        for record in records {
            for field in record.keys().filter(|f| is_foreign_key(f)) {
                let ids = columns.entry(field.as_str()).or_default();
                if let Some(id) = field_text(record, field) {
                    ids.insert(id);
                }
            }
        }

        let mut aliases = AliasMap::new();
        for (field, ids) in columns {
            let Some(target) = kind.reference_target(field) else {
                debug!(field, "no target kind for foreign key");
                continue;
            };
            if !target.has_slug() || ids.is_empty() {
                continue;
            }

            let ids: Vec<String> = ids.into_iter().collect();
            let slugs = self.index.slugs_for(target, &ids)?;
            debug!(
                field,
                target = %target,
                requested = ids.len(),
                resolved = slugs.len(),
                "resolved reference slugs"
            );
            aliases.insert(field.to_string(), slugs);
        }

        Ok(aliases)
    }
}

/// Injects transient alias fields into a working batch.
///
/// A populated alias already present on a record is left alone. Returns the
/// alias columns written, in first-written order.
pub fn inject_aliases(records: &mut [Record], aliases: &AliasMap) -> IndexSet<String> {
    let mut injected = IndexSet::new();
    for record in records.iter_mut() {
        for (field, slugs) in aliases {
            let Some(alias) = alias_field(field) else {
                continue;
            };
            if record.get(&alias).is_some_and(Value::is_populated) {
                continue;
            }
            let Some(slug) = field_text(record, field).and_then(|id| slugs.get(&id)) else {
                continue;
            };
            record.insert(alias.clone(), Value::Str(slug.clone()));
            injected.insert(alias);
        }
    }
    injected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIndex {
        slugs: HashMap<(EntityKind, String), String>,
        calls: Mutex<Vec<(EntityKind, Vec<String>)>>,
    }

    impl FakeIndex {
        fn with(mut self, kind: EntityKind, id: &str, slug: &str) -> Self {
            self.slugs.insert((kind, id.to_string()), slug.to_string());
            self
        }
    }

    impl ReferenceIndex for FakeIndex {
        fn slugs_for(&self, kind: EntityKind, ids: &[String]) -> Result<HashMap<String, String>> {
            self.calls.lock().unwrap().push((kind, ids.to_vec()));
            Ok(ids
                .iter()
                .filter_map(|id| {
                    self.slugs
                        .get(&(kind, id.clone()))
                        .map(|slug| (id.clone(), slug.clone()))
                })
                .collect())
        }
    }

    fn link(id: &str, ability: &str, effect: &str) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::from(id));
        record.insert("ability_id".to_string(), Value::from(ability));
        record.insert("effect_id".to_string(), Value::from(effect));
        record
    }

    #[test]
    fn test_one_lookup_per_column() {
        let index = FakeIndex::default()
            .with(EntityKind::Abilities, "A1", "power-slash")
            .with(EntityKind::Effects, "E1", "bleeding");
        let records = vec![link("L1", "A1", "E1"), link("L2", "A1", "E2"), link("L3", "A1", "E1")];

        let aliases = ReferenceResolver::new(&index)
            .resolve_aliases(EntityKind::AbilityEffectLinks, &records)
            .unwrap();

        let calls = index.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (EntityKind::Abilities, vec!["A1".to_string()]));
        assert_eq!(
            calls[1],
            (EntityKind::Effects, vec!["E1".to_string(), "E2".to_string()])
        );
        assert_eq!(aliases["effect_id"].get("E2"), None);
    }

    #[test]
    fn test_inject_skips_unresolved_and_keeps_existing() {
        let index = FakeIndex::default()
            .with(EntityKind::Abilities, "A1", "power-slash")
            .with(EntityKind::Effects, "E1", "bleeding");
        let mut records = vec![link("L1", "A1", "E1"), link("L2", "A1", "E9")];
        records[0].insert("ability_slug".to_string(), Value::from("custom"));

        let aliases = ReferenceResolver::new(&index)
            .resolve_aliases(EntityKind::AbilityEffectLinks, &records)
            .unwrap();
        let injected = inject_aliases(&mut records, &aliases);

        assert_eq!(
            injected.into_iter().collect::<Vec<_>>(),
            vec!["effect_slug", "ability_slug"]
        );
        assert_eq!(records[0]["ability_slug"], Value::from("custom"));
        assert_eq!(records[0]["effect_slug"], Value::from("bleeding"));
        assert_eq!(records[1]["ability_slug"], Value::from("power-slash"));
        assert!(!records[1].contains_key("effect_slug"));
    }

    #[test]
    fn test_skips_targets_without_slug_and_unknown_targets() {
        let index = FakeIndex::default();
        let mut record = Record::new();
        record.insert("id".to_string(), Value::from("I1"));
        record.insert("requirements_id".to_string(), Value::from("R1"));

        let aliases = ReferenceResolver::new(&index)
            .resolve_aliases(EntityKind::Items, &[record])
            .unwrap();
        assert!(aliases.is_empty());
        assert!(index.calls.lock().unwrap().is_empty());
    }
}
