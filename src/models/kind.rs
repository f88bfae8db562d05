//! Entity kinds and their codec descriptors.
//!
//! The set of tables is closed: every kind resolves to a static
//! [`KindDescriptor`] through a match, so adding a kind is a compile-checked
//! change rather than a startup registration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::enums::EnumKind;
use crate::Error;

/// Suffix marking a foreign-key column.
pub const FOREIGN_KEY_SUFFIX: &str = "_id";

/// Suffix of the transient alias synthesized for a foreign-key column.
pub const ALIAS_SUFFIX: &str = "_slug";

/// A logical table of game content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Character stats (health, crit chance, ...).
    Stats,
    /// Primary attributes (strength, dexterity, ...).
    Attributes,
    /// Attribute-to-stat scaling links.
    AttributeStatLinks,
    /// Items and equipment.
    Items,
    /// Abilities.
    Abilities,
    /// Ability-to-effect links.
    AbilityEffectLinks,
    /// Ability-to-attribute scaling links.
    AbilityScalingLinks,
    /// Status and combat effects.
    Effects,
    /// World timelines.
    Timelines,
    /// Story arcs.
    StoryArcs,
    /// Playable character classes.
    #[serde(rename = "characterclasses")]
    CharacterClasses,
    /// Talent trees.
    TalentTrees,
    /// Talent tree nodes.
    TalentNodes,
    /// Edges between talent nodes.
    TalentNodeLinks,
}

/// Static codec behaviour for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    /// Whether records of this kind carry a human-assigned `slug`.
    pub has_slug: bool,
    /// Ordered fields composing the row key for slug-less link kinds.
    pub composite_key: &'static [&'static str],
    /// Foreign-key fields whose target cannot be guessed from the name.
    pub relations: &'static [(&'static str, EntityKind)],
    /// Fields holding enumeration values.
    pub enum_fields: &'static [(&'static str, EnumKind)],
    /// Storage-only payload fields never written to the interchange file.
    pub internal_fields: &'static [&'static str],
}

impl KindDescriptor {
    const fn slugged(enum_fields: &'static [(&'static str, EnumKind)]) -> Self {
        Self {
            has_slug: true,
            composite_key: &[],
            relations: &[],
            enum_fields,
            internal_fields: &[],
        }
    }

    const fn link(composite_key: &'static [&'static str]) -> Self {
        Self {
            has_slug: false,
            composite_key,
            relations: &[],
            enum_fields: &[],
            internal_fields: &[],
        }
    }

    /// Returns the enumeration declared for a field, if any.
    #[must_use]
    pub fn enum_for(&self, field: &str) -> Option<EnumKind> {
        self.enum_fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Returns true if the field is a storage-only payload.
    #[must_use]
    pub fn is_internal(&self, field: &str) -> bool {
        self.internal_fields.contains(&field)
    }
}

impl EntityKind {
    /// Returns all entity kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stats,
            Self::Attributes,
            Self::AttributeStatLinks,
            Self::Items,
            Self::Abilities,
            Self::AbilityEffectLinks,
            Self::AbilityScalingLinks,
            Self::Effects,
            Self::Timelines,
            Self::StoryArcs,
            Self::CharacterClasses,
            Self::TalentTrees,
            Self::TalentNodes,
            Self::TalentNodeLinks,
        ]
    }

    /// Returns the table name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Attributes => "attributes",
            Self::AttributeStatLinks => "attribute_stat_links",
            Self::Items => "items",
            Self::Abilities => "abilities",
            Self::AbilityEffectLinks => "ability_effect_links",
            Self::AbilityScalingLinks => "ability_scaling_links",
            Self::Effects => "effects",
            Self::Timelines => "timelines",
            Self::StoryArcs => "story_arcs",
            Self::CharacterClasses => "characterclasses",
            Self::TalentTrees => "talent_trees",
            Self::TalentNodes => "talent_nodes",
            Self::TalentNodeLinks => "talent_node_links",
        }
    }

    /// Parses a table name. Accepts hyphens in place of underscores.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Returns the codec descriptor for this kind.
    #[must_use]
    pub const fn descriptor(&self) -> KindDescriptor {
        match self {
            Self::Stats => KindDescriptor::slugged(&[
                ("category", EnumKind::StatCategory),
                ("value_type", EnumKind::StatValueType),
                ("scaling_behavior", EnumKind::ScalingBehavior),
            ]),
            Self::Attributes => KindDescriptor {
                internal_fields: &["results_in"],
                ..KindDescriptor::slugged(&[
                    ("value_type", EnumKind::AttrValueType),
                    ("scaling", EnumKind::AttrScalingType),
                ])
            },
            Self::AttributeStatLinks => KindDescriptor {
                enum_fields: &[("scale", EnumKind::ScaleType)],
                ..KindDescriptor::link(&["attribute_slug", "stat_slug"])
            },
            Self::Items => KindDescriptor {
                internal_fields: &["stat_modifiers", "attribute_modifiers"],
                ..KindDescriptor::slugged(&[
                    ("type", EnumKind::ItemType),
                    ("rarity", EnumKind::Rarity),
                    ("equipment_slot", EnumKind::EquipmentSlot),
                    ("weapon_type", EnumKind::WeaponType),
                ])
            },
            Self::Abilities => KindDescriptor {
                internal_fields: &["effects", "scaling"],
                ..KindDescriptor::slugged(&[
                    ("type", EnumKind::AbilityType),
                    ("targeting", EnumKind::Targeting),
                    ("trigger_condition", EnumKind::AbilityTrigger),
                    ("damage_type_source", EnumKind::DamageTypeSource),
                ])
            },
            Self::AbilityEffectLinks => KindDescriptor::link(&["ability_slug", "effect_slug"]),
            Self::AbilityScalingLinks => {
                KindDescriptor::link(&["ability_slug", "attribute_slug"])
            },
            Self::Effects => KindDescriptor {
                relations: &[("scaling_stat_id", Self::Stats)],
                ..KindDescriptor::slugged(&[
                    ("type", EnumKind::EffectType),
                    ("target", EnumKind::EffectTarget),
                    ("value_type", EnumKind::ValueInterpretation),
                    ("trigger_condition", EnumKind::EffectTrigger),
                ])
            },
            Self::Timelines => KindDescriptor::slugged(&[]),
            Self::StoryArcs => KindDescriptor::slugged(&[
                ("type", EnumKind::ArcType),
                ("content_pack", EnumKind::ContentPack),
            ]),
            Self::CharacterClasses => KindDescriptor::slugged(&[("role", EnumKind::ClassRole)]),
            Self::TalentTrees => KindDescriptor {
                relations: &[("class_id", Self::CharacterClasses)],
                ..KindDescriptor::slugged(&[])
            },
            Self::TalentNodes => KindDescriptor {
                relations: &[("tree_id", Self::TalentTrees)],
                internal_fields: &["stat_modifiers", "attribute_modifiers"],
                ..KindDescriptor::slugged(&[("node_type", EnumKind::TalentNodeType)])
            },
            Self::TalentNodeLinks => KindDescriptor {
                relations: &[
                    ("tree_id", Self::TalentTrees),
                    ("from_node_id", Self::TalentNodes),
                    ("to_node_id", Self::TalentNodes),
                ],
                ..KindDescriptor::link(&["from_node_slug", "to_node_slug"])
            },
        }
    }

    /// Returns true if records of this kind carry a slug.
    #[must_use]
    pub const fn has_slug(&self) -> bool {
        self.descriptor().has_slug
    }

    /// Resolves the kind a foreign-key field points at.
    ///
    /// Declared relations win; otherwise the field stem is pluralized and
    /// matched against known table names (`ability_id` → `abilities`).
    #[must_use]
    pub fn reference_target(&self, field: &str) -> Option<Self> {
        if let Some((_, target)) = self
            .descriptor()
            .relations
            .iter()
            .find(|(name, _)| *name == field)
        {
            return Some(*target);
        }
        let stem = foreign_key_stem(field)?;
        Self::parse(&pluralize(stem))
    }
}

/// Returns true for `<stem>_id` columns (but not `id` itself).
#[must_use]
pub fn is_foreign_key(field: &str) -> bool {
    foreign_key_stem(field).is_some()
}

/// Returns the stem of a foreign-key column (`ability_id` → `ability`).
#[must_use]
pub fn foreign_key_stem(field: &str) -> Option<&str> {
    field
        .strip_suffix(FOREIGN_KEY_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

/// Returns the transient alias name for a foreign-key column.
#[must_use]
pub fn alias_field(field: &str) -> Option<String> {
    foreign_key_stem(field).map(|stem| format!("{stem}{ALIAS_SUFFIX}"))
}

fn pluralize(stem: &str) -> String {
    if let Some(base) = stem.strip_suffix('y') {
        if !base.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{base}ies");
        }
    }
    if stem.ends_with('s') || stem.ends_with("ch") || stem.ends_with('x') {
        return format!("{stem}es");
    }
    format!("{stem}s")
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_roundtrip() {
        for kind in EntityKind::all() {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(EntityKind::parse("Talent-Nodes"), Some(EntityKind::TalentNodes));
        assert!("quests".parse::<EntityKind>().is_err());
    }

    #[test_case(EntityKind::AbilityEffectLinks, "ability_id" => Some(EntityKind::Abilities); "pluralized y")]
    #[test_case(EntityKind::AbilityEffectLinks, "effect_id" => Some(EntityKind::Effects); "pluralized s")]
    #[test_case(EntityKind::StoryArcs, "timeline_id" => Some(EntityKind::Timelines); "heuristic")]
    #[test_case(EntityKind::TalentNodeLinks, "from_node_id" => Some(EntityKind::TalentNodes); "declared")]
    #[test_case(EntityKind::Items, "requirements_id" => None; "unknown target")]
    #[test_case(EntityKind::Items, "id" => None; "primary key")]
    fn test_reference_target(kind: EntityKind, field: &str) -> Option<EntityKind> {
        kind.reference_target(field)
    }

    #[test]
    fn test_alias_field() {
        assert_eq!(alias_field("ability_id").as_deref(), Some("ability_slug"));
        assert_eq!(alias_field("id"), None);
        assert_eq!(alias_field("_id"), None);
    }

    #[test]
    fn test_link_kinds_have_templates() {
        for kind in EntityKind::all() {
            let descriptor = kind.descriptor();
            assert!(
                descriptor.has_slug || !descriptor.composite_key.is_empty(),
                "{kind} has neither slug nor composite key"
            );
        }
    }
}
