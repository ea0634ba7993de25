//! Prometheus metrics.
//!
//! Everything goes through the `metrics` facade; the binary installs the
//! Prometheus recorder and `/metrics` renders its handle.

use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Outcome label of `heatmap_columns_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOutcome {
    Rendered,
    Failed,
}

impl ColumnOutcome {
    fn label(&self) -> &'static str {
        match self {
            ColumnOutcome::Rendered => "rendered",
            ColumnOutcome::Failed => "failed",
        }
    }
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

pub fn record_upload(status: u16) {
    counter!("heatmap_uploads_total", "status" => status.to_string()).increment(1);
}

pub fn record_column(outcome: ColumnOutcome) {
    counter!("heatmap_columns_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_rasterize(backend: &'static str, elapsed: Duration) {
    histogram!("heatmap_rasterize_seconds", "backend" => backend).record(elapsed.as_secs_f64());
}

pub fn record_clear(deleted: usize) {
    counter!("heatmap_artifacts_cleared_total").increment(deleted as u64);
}
