//! Format adapters for import/export.
//!
//! Each format implements [`ImportSource`](super::traits::ImportSource)
//! and/or [`ExportSink`](super::traits::ExportSink). CSV is the only
//! interchange format the engine importer reads.

pub mod csv;

pub use self::csv::{CsvExportSink, CsvImportSource};
