//! Prometheus exposition of the matcher and pipeline hooks.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use corpmatch::{
    set_match_metrics, set_pipeline_metrics, CanonicalError, EvaluatedSignals, IngestError,
    IngestReport, MatchMetrics, PipelineMetrics,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the process-wide Prometheus recorder and the corpmatch hooks.
///
/// Safe to call more than once; only the first call installs anything.
pub fn install() -> Option<&'static PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let hooks = Arc::new(PrometheusHooks);
                set_match_metrics(Some(hooks.clone()));
                set_pipeline_metrics(Some(hooks));
                Some(handle)
            }
            Err(err) => {
                tracing::warn!(error = %err, "prometheus recorder not installed");
                None
            }
        })
        .as_ref()
}

/// Current exposition text, `None` when no recorder is installed.
pub fn render() -> Option<String> {
    PROMETHEUS.get().and_then(Option::as_ref).map(PrometheusHandle::render)
}

/// Forwards corpmatch events to the `metrics` facade.
pub struct PrometheusHooks;

impl MatchMetrics for PrometheusHooks {
    fn record_match(&self, signals: EvaluatedSignals, latency: Duration, hit_count: usize) {
        counter!("corpmatch_search_total", "signals" => signals.label()).increment(1);
        histogram!("corpmatch_search_latency_seconds").record(latency.as_secs_f64());
        histogram!("corpmatch_search_hits").record(hit_count as f64);
    }

    fn record_unparsable_url(&self, _raw: &str, _error: &CanonicalError) {
        counter!("corpmatch_unparsable_url_total", "stage" => "search").increment(1);
    }
}

impl PipelineMetrics for PrometheusHooks {
    fn record_ingest(
        &self,
        latency: Duration,
        entries: usize,
        result: Result<&IngestReport, &IngestError>,
    ) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!("corpmatch_ingest_total", "outcome" => outcome).increment(1);
        counter!("corpmatch_ingest_entries_total").increment(entries as u64);
        histogram!("corpmatch_ingest_latency_seconds").record(latency.as_secs_f64());
    }

    fn record_unparsable_url(&self, _raw: &str, _error: &CanonicalError) {
        counter!("corpmatch_unparsable_url_total", "stage" => "ingest").increment(1);
    }
}
