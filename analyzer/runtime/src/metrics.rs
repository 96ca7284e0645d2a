use crate::core::AnalysisResult;
use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub(crate) struct AnalysisMetrics {
    runs: Counter,
    pods: Gauge,
    allowed_routes: Gauge,
}

impl AnalysisMetrics {
    pub(crate) fn register(prom: &mut Registry) -> Self {
        let metrics = Self::default();

        prom.register(
            "runs",
            "Count of completed analysis passes",
            metrics.runs.clone(),
        );
        prom.register(
            "pods",
            "Gauge of the number of pods in the last analysis",
            metrics.pods.clone(),
        );
        prom.register(
            "allowed_routes",
            "Gauge of the number of allowed routes in the last analysis",
            metrics.allowed_routes.clone(),
        );

        metrics
    }

    pub(crate) fn observe(&self, result: &AnalysisResult) {
        self.runs.inc();
        self.pods.set(result.pods.len() as i64);
        self.allowed_routes.set(result.allowed_routes.len() as i64);
    }
}
