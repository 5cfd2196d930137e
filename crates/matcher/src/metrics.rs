// Metrics hooks for the `matcher` crate.
//
// Callers install a global `MatchMetrics` implementation via [`set_match_metrics`],
// then every `Matcher` reports per-search latency, hit counts and URL parse
// failures without depending on a specific metrics backend.
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use canonical::CanonicalError;

use crate::types::EvaluatedSignals;

/// Metrics observer for match operations.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of a search.
    ///
    /// `signals` are the signals the query evaluated, `latency` is the
    /// wall-clock time from validation to ranked output, and `hit_count` is
    /// the number of matches returned after threshold and limit.
    fn record_match(&self, signals: EvaluatedSignals, latency: Duration, hit_count: usize);

    /// Record a query URL that could not be decomposed. The search continues
    /// without the domain signal.
    fn record_unparsable_url(&self, _raw: &str, _error: &CanonicalError) {}
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
///
/// Typically called once during service startup so all `Matcher` instances
/// share the same metrics backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("match metrics lock poisoned");
    *guard = recorder;
}
