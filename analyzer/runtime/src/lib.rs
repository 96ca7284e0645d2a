#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use netpol_analyzer_core as core;
pub use netpol_analyzer_k8s_index as index;

mod api;
mod args;
mod metrics;

pub use self::args::Args;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// The last fully-computed analysis result.
///
/// The analysis worker takes the write lock only to swap in a freshly
/// allocated result; API readers clone the inner `Arc` under the read lock,
/// so no reader ever observes a partial result.
type SharedResult = Arc<RwLock<Arc<core::AnalysisResult>>>;

/// Recomputes the analysis each time the index reports a change.
///
/// Triggers are a single-slot mailbox: changes that arrive during a pass
/// collapse into one further pass over the latest snapshot. Every pass runs
/// to completion; a full recomputation is cheap and there is nothing to
/// cancel or retry.
async fn analyze(
    index: index::SharedIndex,
    mut changes: watch::Receiver<()>,
    result: SharedResult,
    metrics: metrics::AnalysisMetrics,
) {
    while changes.changed().await.is_ok() {
        let snapshot = index.read().snapshot();
        let start = std::time::Instant::now();
        let analysis = core::analyze(&snapshot);
        metrics.observe(&analysis);
        tracing::debug!(
            pods = analysis.pods.len(),
            routes = analysis.allowed_routes.len(),
            elapsed = ?start.elapsed(),
            "Analysis complete"
        );
        *result.write() = Arc::new(analysis);
    }
}
