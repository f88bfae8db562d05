//! Connection handling for the `SQLite` store.
//!
//! Mutex acquisition with poison recovery and pragma configuration.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Acquires the connection mutex, recovering from poison.
///
/// A panic inside a previous critical section poisons the mutex; the
/// connection itself is still usable, so we log, count and carry on.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a connection for concurrent use.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: durability without an fsync per commit
/// - **`busy_timeout`**: wait for locks instead of failing with `SQLITE_BUSY`
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the busy timeout cannot be set.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal" or "memory"), so the result is ignored
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.busy_timeout(Duration::from_millis(u64::from(BUSY_TIMEOUT_MS)))
        .map_err(|e| Error::operation("configure_busy_timeout", e))?;

    Ok(())
}
