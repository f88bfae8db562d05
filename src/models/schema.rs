//! Declared interchange schemas.
//!
//! Schemas are authored as JSON-Schema-style documents, one per entity kind:
//!
//! ```json
//! {
//!   "title": "Stat",
//!   "type": "object",
//!   "properties": { "id": { "type": "string" }, "tags": { "type": "array" } },
//!   "required": ["id"]
//! }
//! ```
//!
//! They are parsed once into an immutable [`SchemaRegistry`]. Fields a
//! schema omits are deliberately absent from the interchange contract.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

use super::kind::EntityKind;
use crate::{Error, Result};

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text (also used for enum-valued fields).
    String,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Number,
    /// Boolean flag.
    Boolean,
    /// List of values.
    Array,
    /// Nested structure.
    Object,
}

impl FieldType {
    /// Returns the JSON Schema type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Parses a JSON Schema type name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declaration of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declared type.
    pub field_type: FieldType,
    /// Whether an imported row must populate the field.
    pub required: bool,
}

/// Ordered field declarations for one entity kind.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: EntityKind,
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: IndexMap::new(),
        }
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        self.fields.insert(
            name.into(),
            FieldSpec {
                field_type,
                required,
            },
        );
        self
    }

    /// Parses a JSON schema document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the document is not valid JSON,
    /// declares an unsupported type, or lists an undeclared required field.
    pub fn from_json(kind: EntityKind, json: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("schema '{kind}': {e}")))?;

        let mut schema = Self::new(kind);
        for (name, property) in doc.properties {
            let type_name = property.type_decl.primary().ok_or_else(|| {
                Error::InvalidInput(format!("schema '{kind}': field '{name}' has no type"))
            })?;
            let field_type = FieldType::parse(type_name).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "schema '{kind}': field '{name}' has unsupported type '{type_name}'"
                ))
            })?;
            schema.fields.insert(
                name,
                FieldSpec {
                    field_type,
                    required: false,
                },
            );
        }

        for name in doc.required {
            let spec = schema.fields.get_mut(&name).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "schema '{kind}': required field '{name}' is not declared"
                ))
            })?;
            spec.required = true;
        }

        Ok(schema)
    }

    /// The entity kind this schema describes.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the declaration for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Returns true if the schema declares the field.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates declarations in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Declared field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    properties: IndexMap<String, PropertyDocument>,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyDocument {
    #[serde(rename = "type")]
    type_decl: TypeDecl,
}

/// `"type": "string"` or `"type": ["string", "null"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeDecl {
    Single(String),
    Union(Vec<String>),
}

impl TypeDecl {
    fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name),
            Self::Union(names) => names.iter().map(String::as_str).find(|n| *n != "null"),
        }
    }
}

/// Process-wide, read-only schema set.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<EntityKind, Schema>,
}

impl SchemaRegistry {
    /// Loads the schemas bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled document fails to parse.
    pub fn builtin() -> Result<Self> {
        let mut schemas = HashMap::new();
        for kind in EntityKind::all() {
            schemas.insert(*kind, Schema::from_json(*kind, builtin_document(*kind))?);
        }
        Ok(Self { schemas })
    }

    /// Loads schemas from a directory of `<kind>.json` files.
    ///
    /// Kinds without a file in the directory keep their bundled schema.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed.
    #[instrument(fields(dir = %dir.display()))]
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::builtin()?;
        for kind in EntityKind::all() {
            let path = dir.join(format!("{}.json", kind.as_str()));
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::operation("read_schema_file", format!("{}: {e}", path.display())))?;
            registry.insert(Schema::from_json(*kind, &contents)?);
            debug!(kind = %kind, "schema override loaded");
        }
        Ok(registry)
    }

    /// Creates a registry from explicit schemas. Missing kinds get an empty schema.
    #[must_use]
    pub fn from_schemas(schemas: impl IntoIterator<Item = Schema>) -> Self {
        let mut registry = Self {
            schemas: EntityKind::all()
                .iter()
                .map(|kind| (*kind, Schema::new(*kind)))
                .collect(),
        };
        for schema in schemas {
            registry.insert(schema);
        }
        registry
    }

    /// Replaces the schema for its kind.
    pub fn insert(&mut self, schema: Schema) {
        self.schemas.insert(schema.kind(), schema);
    }

    /// Iterates over every registered schema.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Returns the schema for a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKind`] if no schema is registered.
    pub fn get(&self, kind: EntityKind) -> Result<&Schema> {
        self.schemas
            .get(&kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }
}

const fn builtin_document(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Stats => include_str!("../../schemas/stats.json"),
        EntityKind::Attributes => include_str!("../../schemas/attributes.json"),
        EntityKind::AttributeStatLinks => include_str!("../../schemas/attribute_stat_links.json"),
        EntityKind::Items => include_str!("../../schemas/items.json"),
        EntityKind::Abilities => include_str!("../../schemas/abilities.json"),
        EntityKind::AbilityEffectLinks => include_str!("../../schemas/ability_effect_links.json"),
        EntityKind::AbilityScalingLinks => include_str!("../../schemas/ability_scaling_links.json"),
        EntityKind::Effects => include_str!("../../schemas/effects.json"),
        EntityKind::Timelines => include_str!("../../schemas/timelines.json"),
        EntityKind::StoryArcs => include_str!("../../schemas/story_arcs.json"),
        EntityKind::CharacterClasses => include_str!("../../schemas/characterclasses.json"),
        EntityKind::TalentTrees => include_str!("../../schemas/talent_trees.json"),
        EntityKind::TalentNodes => include_str!("../../schemas/talent_nodes.json"),
        EntityKind::TalentNodeLinks => include_str!("../../schemas/talent_node_links.json"),
    }
}
