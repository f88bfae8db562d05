//! Table import service.
//!
//! Reads an interchange CSV back into records and makes them the complete
//! contents of the table. Every row is validated before storage is touched;
//! the write itself is one replace-all transaction.

use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::codec::coercion::{CellRef, coerce_cell};
use crate::codec::formats::CsvImportSource;
use crate::codec::slug::slugify;
use crate::codec::traits::{ImportSource, RawRow, RecordStore};
use crate::models::{
    EntityKind, ID_FIELD, Record, SLUG_FIELD, Schema, SchemaRegistry, Value, field_text,
    record_id,
};
use crate::{Error, Result};

/// Fields tried, in order, when deriving a missing slug.
const SLUG_SOURCES: [&str; 3] = ["name", "title", ID_FIELD];

/// Options for table import.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Validate and report without writing.
    pub dry_run: bool,
}

impl ImportOptions {
    /// Enables or disables dry run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of an import operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows inserted or updated.
    pub imported: usize,
    /// Persisted rows removed because the file no longer contains them.
    pub deleted: usize,
}

/// Service for importing interchange files with replace-all semantics.
pub struct ImportService {
    store: Arc<dyn RecordStore>,
    schemas: Arc<SchemaRegistry>,
    options: ImportOptions,
}

impl ImportService {
    /// Creates a new import service with default options.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            store,
            schemas,
            options: ImportOptions::default(),
        }
    }

    /// Replaces the import options.
    #[must_use]
    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Imports CSV text.
    ///
    /// # Errors
    ///
    /// Returns a row-level error for malformed cells, unresolved enum tokens,
    /// missing or duplicate ids; storage is unchanged in every error case.
    pub fn import(&self, kind: EntityKind, csv: &str) -> Result<ImportSummary> {
        self.import_from_reader(kind, csv.as_bytes())
    }

    /// Imports CSV from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the import fails.
    pub fn import_from_file(&self, kind: EntityKind, path: &Path) -> Result<ImportSummary> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::operation("open_import_file", format!("{}: {e}", path.display()))
        })?;
        self.import_from_reader(kind, BufReader::new(file))
    }

    /// Imports CSV from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, validation or the storage write fails.
    pub fn import_from_reader<R: Read>(&self, kind: EntityKind, reader: R) -> Result<ImportSummary> {
        let mut source = CsvImportSource::new(reader)?;
        self.import_from_source(kind, &mut source)
    }

    /// Imports rows from any source.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the storage write fails.
    #[instrument(skip(self, source), fields(kind = %kind, dry_run = self.options.dry_run))]
    pub fn import_from_source(
        &self,
        kind: EntityKind,
        source: &mut dyn ImportSource,
    ) -> Result<ImportSummary> {
        let start = Instant::now();
        let records = self.parse_rows(kind, source).inspect_err(|e| {
            metrics::counter!("codec_import_failures_total", "kind" => kind.as_str()).increment(1);
            info!(error = %e, "import rejected");
        })?;

        let summary = if self.options.dry_run {
            let imported: HashSet<String> = records.iter().filter_map(record_id).collect();
            let deleted = self
                .store
                .list_ids(kind)?
                .into_iter()
                .filter(|id| !imported.contains(id))
                .count();
            ImportSummary {
                imported: records.len(),
                deleted,
            }
        } else {
            let outcome = self.store.replace_all(kind, &records)?;
            metrics::counter!("codec_rows_imported_total", "kind" => kind.as_str())
                .increment(outcome.upserted as u64);
            metrics::counter!("codec_rows_deleted_total", "kind" => kind.as_str())
                .increment(outcome.deleted as u64);
            ImportSummary {
                imported: outcome.upserted,
                deleted: outcome.deleted,
            }
        };

        metrics::histogram!("codec_import_duration_ms", "kind" => kind.as_str())
            .record(start.elapsed().as_secs_f64() * 1000.0);
        info!(
            imported = summary.imported,
            deleted = summary.deleted,
            "table imported"
        );
        Ok(summary)
    }

    /// Parses and validates every row without touching storage.
    ///
    /// # Errors
    ///
    /// Returns the first row-level error encountered.
    pub fn parse_rows(
        &self,
        kind: EntityKind,
        source: &mut dyn ImportSource,
    ) -> Result<Vec<Record>> {
        let schema = self.schemas.get(kind)?;

        let ignored: IndexSet<&String> = source
            .headers()
            .iter()
            .filter(|header| !header.is_empty() && !schema.declares(header))
            .collect();
        if !ignored.is_empty() {
            debug!(columns = ?ignored, "ignoring undeclared columns");
        }

        let mut records = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        while let Some(row) = source.next()? {
            let record = parse_row(kind, schema, &row)?;
            let id = record_id(&record).ok_or(Error::MissingIdentity { row: row.position })?;
            if seen.insert(id.clone(), row.position).is_some() {
                return Err(Error::DuplicateIdentity {
                    row: row.position,
                    id,
                });
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn parse_row(kind: EntityKind, schema: &Schema, row: &RawRow) -> Result<Record> {
    let descriptor = kind.descriptor();
    let mut record = Record::new();

    for (column, raw) in &row.cells {
        let Some(spec) = schema.field(column) else {
            continue;
        };
        let cell = CellRef {
            row: row.position,
            field: column,
        };
        record.insert(
            column.clone(),
            coerce_cell(cell, spec, descriptor.enum_for(column), raw)?,
        );
    }

    let Some(id) = record_id(&record) else {
        return Err(Error::MissingIdentity { row: row.position });
    };
    record.insert(ID_FIELD.to_string(), Value::Str(id));

    if kind.has_slug() {
        let slug = field_text(&record, SLUG_FIELD).map_or_else(
            || {
                SLUG_SOURCES
                    .iter()
                    .filter_map(|field| field_text(&record, field))
                    .map(|text| slugify(&text))
                    .find(|slug| !slug.is_empty())
            },
            |provided| Some(provided.to_lowercase()),
        );
        if let Some(slug) = slug {
            record.insert(SLUG_FIELD.to_string(), Value::Str(slug));
        }
    }

    for (field, spec) in schema.fields() {
        if spec.required && !record.get(field).is_some_and(Value::is_populated) {
            return Err(Error::MalformedInput {
                row: row.position,
                field: field.to_string(),
                reason: "required field is empty".to_string(),
            });
        }
    }

    Ok(record)
}
