//! Declared enumerations used by entity fields.
//!
//! Each enumeration is a static table of `(symbolic name, display value)`
//! pairs in declaration order. Symbolic names that collide with reserved
//! words carry a trailing underscore (`None_`), which the portable token
//! strips again.

use std::fmt;

type MemberTable = &'static [(&'static str, &'static str)];

/// Every enumeration a field can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    /// Item category.
    ItemType,
    /// Item rarity tier.
    Rarity,
    /// Equipment slot an item occupies.
    EquipmentSlot,
    /// Weapon family.
    WeaponType,
    /// Story arc category.
    ArcType,
    /// Content pack a record ships in.
    ContentPack,
    /// Stat category.
    StatCategory,
    /// Numeric representation of a stat.
    StatValueType,
    /// How a stat scales.
    ScalingBehavior,
    /// Numeric representation of an attribute.
    AttrValueType,
    /// How an attribute scales.
    AttrScalingType,
    /// Scale applied by an attribute-to-stat link.
    ScaleType,
    /// Ability activation model.
    AbilityType,
    /// Ability targeting mode.
    Targeting,
    /// When an ability fires.
    AbilityTrigger,
    /// Where ability damage type comes from.
    DamageTypeSource,
    /// Effect category.
    EffectType,
    /// Effect target.
    EffectTarget,
    /// How an effect value is interpreted.
    ValueInterpretation,
    /// When an effect fires.
    EffectTrigger,
    /// Character class role.
    ClassRole,
    /// Talent node category.
    TalentNodeType,
}

impl EnumKind {
    /// Returns all enumeration kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ItemType,
            Self::Rarity,
            Self::EquipmentSlot,
            Self::WeaponType,
            Self::ArcType,
            Self::ContentPack,
            Self::StatCategory,
            Self::StatValueType,
            Self::ScalingBehavior,
            Self::AttrValueType,
            Self::AttrScalingType,
            Self::ScaleType,
            Self::AbilityType,
            Self::Targeting,
            Self::AbilityTrigger,
            Self::DamageTypeSource,
            Self::EffectType,
            Self::EffectTarget,
            Self::ValueInterpretation,
            Self::EffectTrigger,
            Self::ClassRole,
            Self::TalentNodeType,
        ]
    }

    /// Returns the enumeration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ItemType => "ItemType",
            Self::Rarity => "Rarity",
            Self::EquipmentSlot => "EquipmentSlot",
            Self::WeaponType => "WeaponType",
            Self::ArcType => "ArcType",
            Self::ContentPack => "ContentPack",
            Self::StatCategory => "StatCategory",
            Self::StatValueType => "StatValueType",
            Self::ScalingBehavior => "ScalingBehavior",
            Self::AttrValueType => "AttrValueType",
            Self::AttrScalingType => "AttrScalingType",
            Self::ScaleType => "ScaleType",
            Self::AbilityType => "AbilityType",
            Self::Targeting => "Targeting",
            Self::AbilityTrigger => "AbilityTrigger",
            Self::DamageTypeSource => "DamageTypeSource",
            Self::EffectType => "EffectType",
            Self::EffectTarget => "EffectTarget",
            Self::ValueInterpretation => "ValueInterpretation",
            Self::EffectTrigger => "EffectTrigger",
            Self::ClassRole => "ClassRole",
            Self::TalentNodeType => "TalentNodeType",
        }
    }

    /// Declared members as `(symbolic name, display value)` pairs.
    #[must_use]
    pub const fn table(&self) -> MemberTable {
        match self {
            Self::ItemType => &[
                ("Weapon", "Weapon"),
                ("Armor", "Armor"),
                ("Consumable", "Consumable"),
                ("Misc", "Misc"),
            ],
            Self::Rarity => &[
                ("Common", "Common"),
                ("Uncommon", "Uncommon"),
                ("Rare", "Rare"),
                ("Epic", "Epic"),
                ("Legendary", "Legendary"),
            ],
            Self::EquipmentSlot => &[
                ("head", "head"),
                ("chest", "chest"),
                ("legs", "legs"),
                ("feet", "feet"),
                ("main_hand", "main_hand"),
                ("off_hand", "off_hand"),
                ("accessory", "accessory"),
            ],
            Self::WeaponType => &[
                ("Sword", "Sword"),
                ("Axe", "Axe"),
                ("Bow", "Bow"),
                ("Staff", "Staff"),
                ("Dagger", "Dagger"),
                ("Mace", "Mace"),
            ],
            Self::ArcType => &[
                ("Main", "Main Story"),
                ("Side", "Side Arc"),
                ("Faction", "Faction Arc"),
                ("DLC", "DLC Arc"),
            ],
            Self::ContentPack => &[
                ("Base", "Base"),
                ("DLC1", "DLC1"),
                ("DLC2", "DLC2"),
                ("Expansion", "Expansion"),
            ],
            Self::StatCategory => &[
                ("Attribute", "Attribute"),
                ("Combat", "Combat"),
                ("Defense", "Defense"),
                ("Magic", "Magic"),
                ("Support", "Support"),
            ],
            Self::StatValueType => &[
                ("Int", "int"),
                ("Float", "float"),
                ("Percentage", "percentage"),
            ],
            Self::ScalingBehavior => &[
                ("None_", "None"),
                ("Linear", "Linear"),
                ("Exponential", "Exponential"),
                ("CustomCurve", "Custom Curve"),
            ],
            Self::AttrValueType => &[("Int", "int"), ("Float", "float")],
            Self::AttrScalingType => &[
                ("None_", "None"),
                ("Linear", "Linear"),
                ("Exponential", "Exponential"),
                ("Logarithmic", "Logarithmic"),
            ],
            Self::ScaleType => &[
                ("None_", "None"),
                ("Linear", "Linear"),
                ("Exponential", "Exponential"),
                ("Custom", "Custom"),
            ],
            Self::AbilityType => &[
                ("Active", "Active"),
                ("Passive", "Passive"),
                ("Toggle", "Toggle"),
            ],
            Self::Targeting => &[
                ("Single", "Single"),
                ("Area", "Area"),
                ("Self", "Self"),
                ("Allies", "Allies"),
                ("Enemies", "Enemies"),
            ],
            Self::AbilityTrigger => &[
                ("OnUse", "On Use"),
                ("Passive", "Passive"),
                ("OnHit", "On Hit"),
                ("WhenDamaged", "When Damaged"),
                ("OnKill", "On Kill"),
            ],
            Self::DamageTypeSource => &[
                ("Weapon", "Weapon"),
                ("Fixed", "Fixed"),
                ("None_", "None"),
            ],
            Self::EffectType => &[
                ("Status", "Status"),
                ("Damage", "Damage"),
                ("Heal", "Heal"),
                ("Modifier", "Modifier"),
                ("Reflect", "Reflect"),
                ("Summon", "Summon"),
                ("Shield", "Shield"),
                ("Control", "Control"),
            ],
            Self::EffectTarget => &[
                ("Self", "Self"),
                ("Enemy", "Enemy"),
                ("Ally", "Ally"),
                ("All", "All"),
                ("Area", "Area"),
            ],
            Self::ValueInterpretation => &[
                ("Flat", "Flat"),
                ("Percentage", "Percentage"),
                ("None_", "None"),
            ],
            Self::EffectTrigger => &[
                ("None_", "None"),
                ("OnHit", "On Hit"),
                ("WhenDamaged", "When Damaged"),
                ("OnKill", "On Kill"),
                ("OnCast", "On Cast"),
                ("Passive", "Passive"),
            ],
            Self::ClassRole => &[
                ("Tank", "Tank"),
                ("Damage", "Damage"),
                ("Healer", "Healer"),
                ("Support", "Support"),
                ("Hybrid", "Hybrid"),
            ],
            Self::TalentNodeType => &[
                ("Passive", "Passive"),
                ("Active", "Active"),
                ("Keystone", "Keystone"),
                ("Utility", "Utility"),
            ],
        }
    }

    /// Returns every member in declaration order.
    pub fn members(self) -> impl Iterator<Item = EnumMember> {
        (0..self.table().len()).map(move |index| EnumMember { kind: self, index })
    }

    /// Returns the member at a declaration position.
    #[must_use]
    pub fn nth(self, index: usize) -> Option<EnumMember> {
        (index < self.table().len()).then_some(EnumMember { kind: self, index })
    }

    /// Looks up a member by its exact symbolic name (`None_`, `Main`, ...).
    #[must_use]
    pub fn member(self, name: &str) -> Option<EnumMember> {
        self.table()
            .iter()
            .position(|(n, _)| *n == name)
            .map(|index| EnumMember { kind: self, index })
    }
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member of an [`EnumKind`], identified by declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumMember {
    kind: EnumKind,
    index: usize,
}

impl EnumMember {
    /// The enumeration this member belongs to.
    #[must_use]
    pub const fn kind(&self) -> EnumKind {
        self.kind
    }

    /// Position in declaration order (0-indexed).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Declared symbolic name, including any reserved-word suffix.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.table()[self.index].0
    }

    /// Display value as persisted by the authoring backend.
    #[must_use]
    pub fn value(&self) -> &'static str {
        self.kind.table()[self.index].1
    }

    /// Portable token: the symbolic name with one reserved-word `_` stripped.
    #[must_use]
    pub fn token(&self) -> &'static str {
        let name = self.name();
        name.strip_suffix('_').unwrap_or(name)
    }
}

impl fmt::Display for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.kind, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_strips_reserved_suffix() {
        let none = EnumKind::ScalingBehavior.member("None_").unwrap();
        assert_eq!(none.token(), "None");
        assert_eq!(none.value(), "None");

        let curve = EnumKind::ScalingBehavior.member("CustomCurve").unwrap();
        assert_eq!(curve.token(), "CustomCurve");
        assert_eq!(curve.value(), "Custom Curve");
    }

    #[test]
    fn test_nth_bounds() {
        assert_eq!(EnumKind::ArcType.nth(1).unwrap().name(), "Side");
        assert!(EnumKind::ArcType.nth(4).is_none());
    }

    #[test]
    fn test_member_names_unique_per_kind() {
        for kind in EnumKind::all() {
            let mut names: Vec<_> = kind.table().iter().map(|(n, _)| n.to_lowercase()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "{kind} has colliding member names");
        }
    }
}
