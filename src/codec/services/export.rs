//! Table export service.
//!
//! Turns one entity table into an engine-ready CSV document.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::codec::ROW_KEY_HEADER;
use crate::codec::columns::{check_row_key_header, plan_columns, strip_transient_aliases};
use crate::codec::enum_token::normalize_for_export;
use crate::codec::formats::CsvExportSink;
use crate::codec::property_text::encode;
use crate::codec::references::{ReferenceResolver, inject_aliases};
use crate::codec::row_key::RowKeyResolver;
use crate::codec::traits::{ExportSink, RecordStore};
use crate::models::{EntityKind, Record, SLUG_FIELD, SchemaRegistry, Value};
use crate::{Error, Result};

/// Options for table export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Header of the leading row-key column.
    pub row_key_header: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            row_key_header: ROW_KEY_HEADER.to_string(),
        }
    }
}

impl ExportOptions {
    /// Sets the row-key column header.
    #[must_use]
    pub fn with_row_key_header(mut self, header: impl Into<String>) -> Self {
        self.row_key_header = header.into();
        self
    }
}

/// Result of an export operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Exported table.
    pub kind: EntityKind,
    /// Number of data rows written.
    pub exported: usize,
    /// Number of columns, row-key column included.
    pub columns: usize,
    /// Output path (if file export).
    pub output_path: Option<PathBuf>,
}

/// A fully encoded table, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTable {
    /// Header row.
    pub columns: Vec<String>,
    /// Data rows, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

/// Service for exporting entity tables to the interchange format.
pub struct ExportService {
    store: Arc<dyn RecordStore>,
    schemas: Arc<SchemaRegistry>,
    options: ExportOptions,
}

impl ExportService {
    /// Creates a new export service with default options.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            store,
            schemas,
            options: ExportOptions::default(),
        }
    }

    /// Replaces the export options.
    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Exports a table from storage as CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the CSV cannot be written.
    pub fn export(&self, kind: EntityKind) -> Result<String> {
        let records = self.store.load_records(kind)?;
        self.export_records(kind, records)
    }

    /// Exports an already loaded batch as CSV text.
    ///
    /// Records must be in a stable order; row-key suffixes follow it.
    ///
    /// # Errors
    ///
    /// Returns an error if reference lookups or CSV writing fail.
    pub fn export_records(&self, kind: EntityKind, records: Vec<Record>) -> Result<String> {
        let mut output = Vec::new();
        self.write_records(kind, records, CsvExportSink::new(&mut output))?;
        String::from_utf8(output).map_err(|e| Error::operation("encode_csv_utf8", e))
    }

    /// Exports a table from storage into a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or writing fails.
    pub fn export_to_writer<W: Write>(&self, kind: EntityKind, writer: W) -> Result<ExportResult> {
        let records = self.store.load_records(kind)?;
        self.write_records(kind, records, CsvExportSink::new(writer))
    }

    /// Exports a table from storage into a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or export fails.
    pub fn export_to_file(&self, kind: EntityKind, path: &Path) -> Result<ExportResult> {
        let file = fs::File::create(path).map_err(|e| {
            Error::operation("create_export_file", format!("{}: {e}", path.display()))
        })?;
        let mut result = self.export_to_writer(kind, BufWriter::new(file))?;
        result.output_path = Some(path.to_path_buf());
        Ok(result)
    }

    /// Exports every table into `<dir>/<kind>.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error on the first table that fails.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn export_all(&self, dir: &Path) -> Result<Vec<ExportResult>> {
        fs::create_dir_all(dir).map_err(|e| {
            Error::operation("create_export_dir", format!("{}: {e}", dir.display()))
        })?;

        let mut results = Vec::with_capacity(EntityKind::all().len());
        for kind in EntityKind::all() {
            let path = dir.join(format!("{}.csv", kind.as_str()));
            results.push(self.export_to_file(*kind, &path)?);
        }

        info!(
            tables = results.len(),
            rows = results.iter().map(|r| r.exported).sum::<usize>(),
            "exported all tables"
        );
        Ok(results)
    }

    /// Runs the export pipeline without writing.
    ///
    /// Aliases, enum tokens, row keys, column plan, alias strip, cell
    /// encoding, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is missing, the row-key header names a
    /// real field, or reference lookups fail.
    #[instrument(skip(self, records), fields(kind = %kind, records = records.len()))]
    pub fn encode_table(&self, kind: EntityKind, records: Vec<Record>) -> Result<EncodedTable> {
        let schema = self.schemas.get(kind)?;
        let header = self.options.row_key_header.as_str();
        check_row_key_header(header, [schema])?;
        let descriptor = kind.descriptor();
        let mut working: Vec<Record> = records
            .into_iter()
            .map(|mut record| {
                record.retain(|field, _| !descriptor.is_internal(field));
                record
            })
            .collect();

        if working.iter().any(|record| record.contains_key(header)) {
            return Err(Error::InvalidInput(format!(
                "row_key_header '{header}' is a stored field of {kind}"
            )));
        }

        let aliases = ReferenceResolver::new(self.store.as_ref()).resolve_aliases(kind, &working)?;
        let injected = inject_aliases(&mut working, &aliases);
        debug!(columns = ?injected, "injected reference aliases");

        for record in &mut working {
            for (field, enum_kind) in descriptor.enum_fields {
                if let Some(value) = record.get_mut(*field) {
                    let normalized = normalize_for_export(*enum_kind, std::mem::take(value));
                    if let Value::Str(raw) = &normalized {
                        warn!(field = *field, value = %raw, "enum value matches no member");
                    }
                    *value = normalized;
                }
            }
        }

        let mut resolver = RowKeyResolver::new();
        let keys: Vec<String> = working
            .iter()
            .map(|record| resolver.resolve(kind, record))
            .collect();
        if descriptor.has_slug {
            for (record, key) in working.iter_mut().zip(&keys) {
                record.insert(SLUG_FIELD.to_string(), Value::Str(key.clone()));
            }
        }

        let columns = strip_transient_aliases(
            plan_columns(kind, schema, &working, header),
            schema,
            &injected,
        );

        let rows = working
            .iter()
            .zip(keys)
            .map(|(record, key)| {
                let mut cells = Vec::with_capacity(columns.len());
                cells.push(key);
                cells.extend(
                    columns[1..]
                        .iter()
                        .map(|column| record.get(column).map(encode).unwrap_or_default()),
                );
                cells
            })
            .collect();

        Ok(EncodedTable { columns, rows })
    }

    fn write_records<W: Write>(
        &self,
        kind: EntityKind,
        records: Vec<Record>,
        sink: CsvExportSink<W>,
    ) -> Result<ExportResult> {
        let start = Instant::now();
        let table = self.encode_table(kind, records)?;

        let mut sink: Box<dyn ExportSink + '_> = Box::new(sink);
        sink.write_header(&table.columns)?;
        for row in &table.rows {
            sink.write_row(row)?;
        }
        sink.finalize()?;

        metrics::counter!("codec_rows_exported_total", "kind" => kind.as_str())
            .increment(table.rows.len() as u64);
        metrics::histogram!("codec_export_duration_ms", "kind" => kind.as_str())
            .record(start.elapsed().as_secs_f64() * 1000.0);
        debug!(kind = %kind, rows = table.rows.len(), "table exported");

        Ok(ExportResult {
            kind,
            exported: table.rows.len(),
            columns: table.columns.len(),
            output_path: None,
        })
    }
}
