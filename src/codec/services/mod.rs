//! Export and import orchestration.

pub mod export;
pub mod import;

pub use export::{EncodedTable, ExportOptions, ExportResult, ExportService};
pub use import::{ImportOptions, ImportService, ImportSummary};
