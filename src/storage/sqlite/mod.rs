//! `SQLite` record store.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition with poison recovery, pragma setup
//! - [`metrics`]: per-operation counters and latency histograms
//! - [`store`]: the [`SqliteStore`] itself

mod connection;
mod metrics;
mod store;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock, configure_connection};
pub use metrics::record_operation_metrics;
pub use store::SqliteStore;
