//! Command handlers module.
//!
//! - `io.rs`: export, export-all and import
//! - `kinds.rs`: kind listing and schema display

mod io;
mod kinds;

use std::sync::Arc;

use tablesmith::config::TablesmithConfig;
use tablesmith::models::SchemaRegistry;
use tablesmith::storage::SqliteStore;
use tablesmith::{EntityKind, Error, Result};

pub use io::{cmd_export, cmd_export_all, cmd_import};
pub use kinds::{cmd_kinds, cmd_schema};

/// Parses a kind argument, listing the valid names on failure.
fn parse_kind(name: &str) -> Result<EntityKind> {
    name.parse::<EntityKind>().map_err(|_| {
        let valid: Vec<&str> = EntityKind::all().iter().map(EntityKind::as_str).collect();
        Error::UnknownKind(format!("{name} (expected one of: {})", valid.join(", ")))
    })
}

/// Opens the configured store, creating its parent directory.
fn open_store(config: &TablesmithConfig) -> Result<Arc<SqliteStore>> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_db_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }
    Ok(Arc::new(SqliteStore::new(&config.db_path)?))
}

fn load_schemas(config: &TablesmithConfig) -> Result<Arc<SchemaRegistry>> {
    config.load_schemas().map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("story-arcs").unwrap(), EntityKind::StoryArcs);

        let err = parse_kind("quests").unwrap_err();
        assert!(err.to_string().contains("talent_node_links"));
    }

    #[test]
    fn test_open_store_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let config = TablesmithConfig::new().with_db_path(dir.path().join("data").join("content.db"));

        let store = open_store(&config).unwrap();
        assert!(dir.path().join("data").join("content.db").exists());
        assert_eq!(store.count(EntityKind::Items).unwrap(), 0);
    }
}
