//! Storage operation metrics.

use std::time::Instant;

/// Backend label attached to every storage metric.
pub const BACKEND: &str = "sqlite";

/// Records count and latency for one storage operation.
///
/// Emits `storage_operations_total` and `storage_operation_duration_ms`,
/// both labelled by backend, operation and status (`success`/`error`).
pub fn record_operation_metrics(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => BACKEND,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => BACKEND,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to its metric status label.
pub const fn status_of<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
