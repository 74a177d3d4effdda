//! Prometheus metrics for the archive pipeline.
//!
//! Provides metrics for:
//! - Rows moved into each archive table
//! - Per-row archive failures
//! - Archive table sizes
//! - Rows pruned from the live queues
//! - Run outcomes
//!
//! Every metric carries the `job`, `server` and `worker` labels of the
//! invocation that recorded it.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, gauge};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::{archive::JobContext, config::MetricsConfig};

/// Global Prometheus handle for rendering.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
///
/// With a `listen_address` the exporter future is spawned onto the current
/// tokio runtime, so this must be called from within one.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = match config.listen_address {
        Some(addr) => {
            let (recorder, exporter) = PrometheusBuilder::new()
                .with_http_listener(addr)
                .build()?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|e| MetricsError::Setup(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::error!(error = ?e, "Metrics listener exited");
                }
            });
            tracing::info!(address = %addr, "Serving Prometheus metrics");
            handle
        }
        None => PrometheusBuilder::new().install_recorder()?,
    };

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Write the current metrics in Prometheus text format to `path`.
///
/// The file is written next to its destination and renamed into place so a
/// collector never reads a partial file. Does nothing if metrics were never
/// initialized.
pub fn write_textfile(path: &std::path::Path) -> Result<(), MetricsError> {
    #[cfg(feature = "prometheus")]
    {
        let Some(handle) = get_prometheus_handle() else {
            return Ok(());
        };
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, handle.render())?;
        std::fs::rename(&tmp, path)?;
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = path;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record rows confirmed in an archive table.
pub fn record_archive_moved(table: &str, count: u64, job: &JobContext) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "archive_rows_moved_total",
            "table" => table.to_string(),
            "job" => job.job_id.clone(),
            "server" => job.server_id.clone(),
            "worker" => job.worker_id.clone()
        )
        .increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (table, count, job);
    }
}

/// Record a single row that could not be written to an archive table.
pub fn record_archive_failure(table: &str, job: &JobContext) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "archive_row_failures_total",
            "table" => table.to_string(),
            "job" => job.job_id.clone(),
            "server" => job.server_id.clone(),
            "worker" => job.worker_id.clone()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (table, job);
    }
}

/// Set the total row count of an archive table.
pub fn set_archive_table_rows(table: &str, rows: i64, job: &JobContext) {
    #[cfg(feature = "prometheus")]
    {
        gauge!(
            "archive_table_rows",
            "table" => table.to_string(),
            "job" => job.job_id.clone(),
            "server" => job.server_id.clone(),
            "worker" => job.worker_id.clone()
        )
        .set(rows as f64);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (table, rows, job);
    }
}

/// Record rows deleted from a live queue.
pub fn record_live_deletions(table: &str, count: u64, job: &JobContext) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "archive_live_deletions_total",
            "table" => table.to_string(),
            "job" => job.job_id.clone(),
            "server" => job.server_id.clone(),
            "worker" => job.worker_id.clone()
        )
        .increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (table, count, job);
    }
}

/// Record the outcome of a whole invocation ("ok" or "error").
pub fn record_archive_run(status: &str, job: &JobContext) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "archive_runs_total",
            "status" => status.to_string(),
            "job" => job.job_id.clone(),
            "server" => job.server_id.clone(),
            "worker" => job.worker_id.clone()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (status, job);
    }
}

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[error("Failed to write metrics textfile: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
