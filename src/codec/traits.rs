//! Seams between the codec and its collaborators.
//!
//! Storage implements [`RecordSource`], [`ReferenceIndex`] and
//! [`RecordSink`]; format adapters implement [`ImportSource`] and
//! [`ExportSink`].

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::Result;
use crate::models::{EntityKind, Record};

/// Ordered, fully materialized records of one kind.
pub trait RecordSource: Send + Sync {
    /// Loads every record of a kind in a stable order.
    ///
    /// Row-key disambiguation suffixes follow this order, so it must not
    /// change between calls on unchanged data.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn load_records(&self, kind: EntityKind) -> Result<Vec<Record>>;

    /// Lists the primary keys currently persisted for a kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn list_ids(&self, kind: EntityKind) -> Result<Vec<String>>;
}

/// Read-only `primary key → slug` lookup.
pub trait ReferenceIndex: Send + Sync {
    /// Resolves slugs for a set of primary keys in one lookup.
    ///
    /// Ids without a record or without a slug are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn slugs_for(&self, kind: EntityKind, ids: &[String]) -> Result<HashMap<String, String>>;
}

/// Counts reported by a replace-all write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Rows inserted or updated.
    pub upserted: usize,
    /// Persisted rows removed because they were absent from the batch.
    pub deleted: usize,
}

/// Destination for a replace-all import.
pub trait RecordSink: Send + Sync {
    /// Atomically makes `records` the complete contents of `kind`.
    ///
    /// Every record is upserted by `id` and every persisted id not in the
    /// batch is deleted. On error nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be committed.
    fn replace_all(&self, kind: EntityKind, records: &[Record]) -> Result<ReplaceOutcome>;
}

/// Everything the export and import services need from storage.
pub trait RecordStore: RecordSource + ReferenceIndex + RecordSink {}

impl<T: RecordSource + ReferenceIndex + RecordSink> RecordStore for T {}

/// One data row of an interchange file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data row (header excluded).
    pub position: usize,
    /// Cells keyed by column header, in file order.
    pub cells: IndexMap<String, String>,
}

impl RawRow {
    /// Returns a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// Source of raw interchange rows.
pub trait ImportSource {
    /// Column headers in file order.
    fn headers(&self) -> &[String];

    /// Reads the next row, or `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be parsed.
    fn next(&mut self) -> Result<Option<RawRow>>;
}

/// Destination for encoded interchange rows.
pub trait ExportSink {
    /// Writes the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_header(&mut self, columns: &[String]) -> Result<()>;

    /// Writes one data row, aligned with the header.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_row(&mut self, cells: &[String]) -> Result<()>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}
