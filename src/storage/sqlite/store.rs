//! `SQLite`-backed record store.

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, instrument};

use super::connection::{acquire_lock, configure_connection};
use super::metrics::{record_operation_metrics, status_of};
use crate::codec::traits::{RecordSink, RecordSource, ReferenceIndex, ReplaceOutcome};
use crate::models::{EntityKind, Record, SLUG_FIELD, Value, field_text, record_id};
use crate::{Error, Result};

/// Ids per `IN (...)` lookup, well below `SQLite`'s bound-parameter limit.
const LOOKUP_CHUNK: usize = 500;

type Payload = serde_json::Map<String, serde_json::Value>;

/// Record store keeping every entity kind in one `SQLite` table.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access. WAL mode and the
/// `busy_timeout` pragma cover other processes sharing the file.
///
/// # Schema
///
/// `records(kind, id, slug, position, payload)` keyed by `(kind, id)`:
/// - `slug`: copy of the record's slug for bulk reference lookups
/// - `position`: insertion order, the stable export order
/// - `payload`: the full record as a JSON object
///
/// Enum members persist as their display value and come back as strings.
pub struct SqliteStore {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    /// Path to the database file (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates a store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)
            .map_err(|e| Error::operation("open_sqlite", format!("{}: {e}", db_path.display())))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::operation("open_sqlite_in_memory", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                kind TEXT NOT NULL,
                id TEXT NOT NULL,
                slug TEXT,
                position INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (kind, id)
            )",
            [],
        )
        .map_err(|e| Error::operation("create_records_table", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_kind_position ON records(kind, position)",
            [],
        )
        .map_err(|e| Error::operation("create_records_index", e))?;

        Ok(())
    }

    /// Inserts or updates one record, replacing its payload.
    ///
    /// New records are appended after the current last position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the record has no `id`, or an
    /// operation error if the write fails.
    #[instrument(skip(self, record), fields(kind = %kind))]
    pub fn upsert(&self, kind: EntityKind, record: &Record) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            let id = require_id(kind, record)?;
            let payload = encode_payload(&to_payload(record))?;
            let conn = acquire_lock(&self.conn);

            conn.execute(
                "INSERT INTO records (kind, id, slug, position, payload)
                 VALUES (?1, ?2, ?3,
                         (SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE kind = ?1),
                         ?4)
                 ON CONFLICT(kind, id) DO UPDATE SET slug = excluded.slug, payload = excluded.payload",
                params![kind.as_str(), id, slug_of(kind, record), payload],
            )
            .map_err(|e| Error::operation("upsert_record", e))?;

            Ok(())
        })();

        record_operation_metrics("upsert", start, status_of(&result));
        result
    }

    /// Fetches one record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the payload is corrupt.
    #[instrument(skip(self), fields(kind = %kind))]
    pub fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Record>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM records WHERE kind = ?1 AND id = ?2",
                    params![kind.as_str(), id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| Error::operation("get_record", e))?;

            payload
                .map(|text| decode_payload(kind, id, &text))
                .transpose()
        })();

        record_operation_metrics("get", start, status_of(&result));
        result
    }

    /// Deletes one record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub fn delete(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let deleted = conn
                .execute(
                    "DELETE FROM records WHERE kind = ?1 AND id = ?2",
                    params![kind.as_str(), id],
                )
                .map_err(|e| Error::operation("delete_record", e))?;
            Ok(deleted > 0)
        })();

        record_operation_metrics("delete", start, status_of(&result));
        result
    }

    /// Counts the records of a kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::operation("count_records", e))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl RecordSource for SqliteStore {
    #[instrument(skip(self), fields(kind = %kind))]
    fn load_records(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(
                    "SELECT id, payload FROM records WHERE kind = ?1 ORDER BY position, id",
                )
                .map_err(|e| Error::operation("prepare_load_records", e))?;

            let rows = stmt
                .query_map(params![kind.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| Error::operation("load_records", e))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, payload) = row.map_err(|e| Error::operation("read_record_row", e))?;
                records.push(decode_payload(kind, &id, &payload)?);
            }
            debug!(count = records.len(), "loaded records");
            Ok(records)
        })();

        record_operation_metrics("load_records", start, status_of(&result));
        result
    }

    #[instrument(skip(self), fields(kind = %kind))]
    fn list_ids(&self, kind: EntityKind) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare("SELECT id FROM records WHERE kind = ?1 ORDER BY position, id")
                .map_err(|e| Error::operation("prepare_list_ids", e))?;

            let ids = stmt
                .query_map(params![kind.as_str()], |row| row.get::<_, String>(0))
                .map_err(|e| Error::operation("list_ids", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| Error::operation("read_id_row", e))?;
            Ok(ids)
        })();

        record_operation_metrics("list_ids", start, status_of(&result));
        result
    }
}

impl ReferenceIndex for SqliteStore {
    #[instrument(skip(self, ids), fields(kind = %kind, ids = ids.len()))]
    fn slugs_for(&self, kind: EntityKind, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let mut slugs = HashMap::with_capacity(ids.len());

            for chunk in ids.chunks(LOOKUP_CHUNK) {
                let placeholders = (0..chunk.len())
                    .map(|i| format!("?{}", i + 2))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "SELECT id, slug FROM records
                     WHERE kind = ?1 AND slug IS NOT NULL AND slug <> '' AND id IN ({placeholders})"
                );
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| Error::operation("prepare_slugs_for", e))?;

                let bound = std::iter::once(kind.as_str()).chain(chunk.iter().map(String::as_str));
                let rows = stmt
                    .query_map(params_from_iter(bound), |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })
                    .map_err(|e| Error::operation("slugs_for", e))?;

                for row in rows {
                    let (id, slug) = row.map_err(|e| Error::operation("read_slug_row", e))?;
                    slugs.insert(id, slug);
                }
            }
            Ok(slugs)
        })();

        record_operation_metrics("slugs_for", start, status_of(&result));
        result
    }
}

impl RecordSink for SqliteStore {
    /// Replaces the contents of a kind in one `BEGIN IMMEDIATE` transaction.
    ///
    /// Imported fields are merged over the stored payload, so fields the
    /// interchange file never carries (internal payloads) survive a round
    /// trip. Rows whose id is absent from the batch are deleted.
    #[instrument(skip(self, records), fields(kind = %kind, records = records.len()))]
    fn replace_all(&self, kind: EntityKind, records: &[Record]) -> Result<ReplaceOutcome> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            conn.execute("BEGIN IMMEDIATE", [])
                .map_err(|e| Error::operation("begin_transaction", e))?;

            let result = (|| -> Result<ReplaceOutcome> {
                let mut existing = load_payloads(&conn, kind)?;
                let mut seen = HashSet::with_capacity(records.len());

                let mut upsert = conn
                    .prepare(
                        "INSERT INTO records (kind, id, slug, position, payload)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT(kind, id) DO UPDATE SET
                             slug = excluded.slug,
                             position = excluded.position,
                             payload = excluded.payload",
                    )
                    .map_err(|e| Error::operation("prepare_upsert", e))?;

                for (index, record) in records.iter().enumerate() {
                    let id = require_id(kind, record)?;
                    if !seen.insert(id.clone()) {
                        return Err(Error::DuplicateIdentity { row: index + 1, id });
                    }

                    let mut payload = existing.remove(&id).unwrap_or_default();
                    payload.extend(to_payload(record));
                    let position = i64::try_from(index).unwrap_or(i64::MAX);

                    upsert
                        .execute(params![
                            kind.as_str(),
                            id,
                            slug_of(kind, record),
                            position,
                            encode_payload(&payload)?
                        ])
                        .map_err(|e| Error::operation("upsert_record", e))?;
                }

                let mut delete = conn
                    .prepare("DELETE FROM records WHERE kind = ?1 AND id = ?2")
                    .map_err(|e| Error::operation("prepare_delete", e))?;
                for id in existing.keys() {
                    delete
                        .execute(params![kind.as_str(), id])
                        .map_err(|e| Error::operation("delete_record", e))?;
                }

                Ok(ReplaceOutcome {
                    upserted: records.len(),
                    deleted: existing.len(),
                })
            })();

            if result.is_ok() {
                conn.execute("COMMIT", [])
                    .map_err(|e| Error::operation("commit_transaction", e))?;
            } else {
                let _ = conn.execute("ROLLBACK", []);
            }

            result
        })();

        if let Ok(outcome) = &result {
            debug!(
                upserted = outcome.upserted,
                deleted = outcome.deleted,
                "replaced table contents"
            );
        }
        record_operation_metrics("replace_all", start, status_of(&result));
        result
    }
}

fn require_id(kind: EntityKind, record: &Record) -> Result<String> {
    record_id(record)
        .ok_or_else(|| Error::InvalidInput(format!("{kind} record has no id")))
}

fn slug_of(kind: EntityKind, record: &Record) -> Option<String> {
    if kind.has_slug() {
        field_text(record, SLUG_FIELD)
    } else {
        None
    }
}

fn to_payload(record: &Record) -> Payload {
    record
        .iter()
        .map(|(field, value)| (field.clone(), value.to_json()))
        .collect()
}

fn encode_payload(payload: &Payload) -> Result<String> {
    serde_json::to_string(payload).map_err(|e| Error::operation("encode_payload", e))
}

fn decode_payload(kind: EntityKind, id: &str, text: &str) -> Result<Record> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::operation("decode_payload", format!("{kind}/{id}: {e}")))?;
    match Value::from_json(json) {
        Value::Struct(fields) => Ok(fields),
        _ => Err(Error::operation(
            "decode_payload",
            format!("{kind}/{id}: payload is not an object"),
        )),
    }
}

fn load_payloads(conn: &Connection, kind: EntityKind) -> Result<HashMap<String, Payload>> {
    let mut stmt = conn
        .prepare("SELECT id, payload FROM records WHERE kind = ?1")
        .map_err(|e| Error::operation("prepare_load_payloads", e))?;
    let rows = stmt
        .query_map(params![kind.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| Error::operation("load_payloads", e))?;

    let mut payloads = HashMap::new();
    for row in rows {
        let (id, text) = row.map_err(|e| Error::operation("read_payload_row", e))?;
        let payload = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => Payload::new(),
            Err(e) => {
                return Err(Error::operation(
                    "decode_payload",
                    format!("{kind}/{id}: {e}"),
                ));
            },
        };
        payloads.insert(id, payload);
    }
    Ok(payloads)
}
