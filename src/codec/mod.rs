//! CSV interchange codec.
//!
//! Converts entity tables into the flat CSV format read by engine
//! data-table importers, and back again.
//!
//! # Architecture
//!
//! - **Leaf transforms**: [`slug`], [`row_key`], [`enum_token`],
//!   [`property_text`], [`columns`], [`coercion`]
//! - **Reference aliases**: [`references`] resolves foreign keys in bulk
//! - **Format adapters**: [`formats`] implement [`ImportSource`] and [`ExportSink`]
//! - **Services**: [`services`] orchestrate storage, transforms and formats
//!
//! # Examples
//!
//! ```rust,ignore
//! use tablesmith::codec::services::{ExportService, ImportService};
//!
//! let csv = export.export(EntityKind::Abilities)?;
//! let summary = import.import(EntityKind::Abilities, &csv)?;
//! println!("{} imported, {} deleted", summary.imported, summary.deleted);
//! ```

pub mod coercion;
pub mod columns;
pub mod enum_token;
pub mod formats;
pub mod property_text;
pub mod references;
pub mod row_key;
pub mod services;
pub mod slug;
pub mod traits;

pub use enum_token::{EnumResolution, from_token, to_token};
pub use slug::{slugify, tokenize};
pub use traits::{
    ExportSink, ImportSource, RawRow, RecordSink, RecordSource, RecordStore, ReferenceIndex,
    ReplaceOutcome,
};

/// Default header of the leading row-key column.
///
/// Not a valid field name, so it never collides with a real column.
pub const ROW_KEY_HEADER: &str = "---";
