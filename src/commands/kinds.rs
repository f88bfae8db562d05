//! Kind listing and schema display.

use tablesmith::config::TablesmithConfig;
use tablesmith::{EntityKind, Result};

use super::{load_schemas, parse_kind};

/// Lists every supported kind and how its row keys are built.
pub fn cmd_kinds() -> Result<()> {
    println!("{:<24}ROW KEY", "KIND");
    for kind in EntityKind::all() {
        println!("{:<24}{}", kind.as_str(), row_key_source(*kind));
    }
    Ok(())
}

/// Prints the loaded schema for one kind.
pub fn cmd_schema(config: &TablesmithConfig, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let schemas = load_schemas(config)?;
    let schema = schemas.get(kind)?;
    let descriptor = kind.descriptor();

    println!("Schema: {kind}");
    println!();
    for (name, spec) in schema.fields() {
        let mut notes = Vec::new();
        if spec.required {
            notes.push("required".to_string());
        }
        if let Some(enum_kind) = descriptor.enum_for(name) {
            notes.push(format!("enum {enum_kind}"));
        }
        if let Some(target) = kind.reference_target(name) {
            notes.push(format!("-> {target}"));
        }
        println!(
            "  {name:<28}{:<10}{}",
            spec.field_type.as_str(),
            notes.join(", ")
        );
    }
    if !descriptor.internal_fields.is_empty() {
        println!();
        println!("  Not exported: {}", descriptor.internal_fields.join(", "));
    }

    Ok(())
}

fn row_key_source(kind: EntityKind) -> String {
    let descriptor = kind.descriptor();
    if descriptor.has_slug {
        "slug".to_string()
    } else {
        descriptor.composite_key.join(" + ")
    }
}
