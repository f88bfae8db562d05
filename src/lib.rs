//! # Tablesmith
//!
//! CSV data-table codec for structured game content.
//!
//! Tablesmith converts entity tables (items, abilities, talent trees, ...)
//! into the flat CSV interchange format consumed by engine data-table
//! importers, and imports such files back with replace-all semantics.
//!
//! ## Features
//!
//! - Stable, collision-free row keys derived from slugs, composite templates
//!   or the best available descriptive field
//! - Enum values exported as portable symbolic tokens
//! - Arrays and structs encoded in engine property text, not JSON
//! - Foreign keys resolved in bulk to readable slug aliases
//! - Schema-driven type coercion and transactional replace-all import
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tablesmith::{EntityKind, ExportService, SchemaRegistry};
//! use tablesmith::storage::SqliteStore;
//!
//! let store = Arc::new(SqliteStore::in_memory()?);
//! let schemas = Arc::new(SchemaRegistry::builtin()?);
//! let service = ExportService::new(store, schemas);
//! let csv = service.export(EntityKind::Items)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod codec;
pub mod config;
pub mod models;
pub mod observability;
pub mod storage;

pub use codec::services::{ExportService, ImportService, ImportSummary};
pub use codec::{ROW_KEY_HEADER, slugify, tokenize};
pub use config::TablesmithConfig;
pub use models::{EntityKind, EnumKind, EnumMember, FieldType, Record, Schema, SchemaRegistry, Value};

/// Error type for tablesmith operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `MalformedInput` | A CSV cell cannot be coerced to its declared type |
/// | `UnresolvedEnumToken` | An enum cell matches no member |
/// | `MissingIdentity` | An imported row has no `id` |
/// | `DuplicateIdentity` | Two imported rows share an `id` |
/// | `UnknownKind` | An entity kind name is not recognised |
/// | `InvalidInput` | Bad CLI arguments, unreadable schema documents |
/// | `OperationFailed` | Storage, CSV or filesystem failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A cell could not be parsed as its declared type.
    ///
    /// Raised when:
    /// - An integer, number or boolean cell does not parse
    /// - An array or object cell violates the property-text grammar
    /// - A required field is empty after slug derivation
    #[error("malformed input at row {row}, field '{field}': {reason}")]
    MalformedInput {
        /// 1-based data row (header excluded).
        row: usize,
        /// Offending field.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// An enum cell matched none of the resolution strategies.
    #[error("unresolved enum token '{token}' at row {row}, field '{field}'")]
    UnresolvedEnumToken {
        /// 1-based data row (header excluded).
        row: usize,
        /// Offending field.
        field: String,
        /// The raw token as it appeared in the file.
        token: String,
    },

    /// An imported row has no usable `id`.
    #[error("missing id at row {row}")]
    MissingIdentity {
        /// 1-based data row (header excluded).
        row: usize,
    },

    /// Two rows in one import share an `id`.
    #[error("duplicate id '{id}' at row {row}")]
    DuplicateIdentity {
        /// 1-based data row of the second occurrence.
        row: usize,
        /// The repeated id.
        id: String,
    },

    /// The entity kind is not one of the supported tables.
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A schema document is not valid JSON or declares an unknown type
    /// - CLI arguments are inconsistent
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` operations fail
    /// - CSV reading or writing fails
    /// - Filesystem I/O errors occur
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns the 1-based data row this error points at, when it has one.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::MalformedInput { row, .. }
            | Self::UnresolvedEnumToken { row, .. }
            | Self::MissingIdentity { row }
            | Self::DuplicateIdentity { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Shorthand for an [`Error::OperationFailed`] with a displayable cause.
    pub(crate) fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for tablesmith operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedInput {
            row: 3,
            field: "cooldown".to_string(),
            reason: "expected a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed input at row 3, field 'cooldown': expected a number"
        );

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::DuplicateIdentity {
            row: 7,
            id: "01A".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate id '01A' at row 7");
    }

    #[test]
    fn test_error_row() {
        assert_eq!(Error::MissingIdentity { row: 4 }.row(), Some(4));
        assert_eq!(Error::UnknownKind("x".to_string()).row(), None);
    }
}
