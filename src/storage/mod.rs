//! Record storage.
//!
//! The codec only sees storage through the traits in
//! [`crate::codec::traits`]. [`SqliteStore`] is the bundled implementation:
//! one `records` table holding every entity kind as JSON payloads.

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]
// Allow manual_let_else for clearer error handling in some contexts.
#![allow(clippy::manual_let_else)]

pub mod sqlite;

pub use sqlite::SqliteStore;
