use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use canonical::{decompose_url, CanonicalError, NormalizerConfig};
use registry::{CandidateQuery, CandidateRecord};
use tracing::{debug, warn};

use crate::metrics::metrics_recorder;
use crate::similarity::trigram_similarity;
use crate::source::CandidateSource;
use crate::types::{
    MatchConfig, MatchError, MatchRequest, PreparedQuery, QueryEntity, RankedMatch,
    RankedMatches, SignalScores,
};


/// Per-signal scores of `candidate` against `query`.
///
/// A signal is absent when the query did not evaluate it or the candidate has
/// no value for it.
pub fn score(query: &PreparedQuery, candidate: &CandidateRecord) -> SignalScores {
    let signals = query.signals();

    let name = (signals.name && !candidate.normalized_key.is_empty())
        .then(|| trigram_similarity(query.name(), &candidate.normalized_key));

    let domain = match (query.domain(), candidate.domain.as_deref()) {
        (Some(wanted), Some(found)) if signals.domain => {
            Some(if wanted == found { 1.0 } else { 0.0 })
        }
        _ => None,
    };

    SignalScores { name, domain }
}

/// Score, filter, order and truncate `candidates`.
///
/// Candidates whose aggregate is not strictly greater than `theta` are
/// dropped, as are candidates with no present signal. Order is aggregate,
/// then name score, then domain score (all descending), then candidate id.
pub fn rank(
    query: &PreparedQuery,
    candidates: &[CandidateRecord],
    limit: usize,
    theta: f64,
) -> Result<Vec<RankedMatch>, MatchError> {
    if query.signals().is_empty() {
        return Err(MatchError::NoSignals);
    }
    if limit == 0 {
        return Err(MatchError::InvalidLimit(
            "limit must be a positive integer".into(),
        ));
    }
    if !theta.is_finite() {
        return Err(MatchError::InvalidTheta(format!("{theta} is not finite")));
    }

    let scored = candidates.iter().filter_map(|candidate| {
        let scores = score(query, candidate);
        scores.aggregate().map(|aggregate| RankedMatch {
            candidate: candidate.clone(),
            scores,
            aggregate,
        })
    });
    Ok(select(scored, limit, theta))
}

pub(crate) fn select(
    scored: impl IntoIterator<Item = RankedMatch>,
    limit: usize,
    theta: f64,
) -> Vec<RankedMatch> {
    let mut kept: Vec<RankedMatch> = scored
        .into_iter()
        .filter(|m| m.aggregate > theta)
        .collect();
    kept.sort_by(ranking_order);
    kept.truncate(limit);
    kept
}

fn ranking_order(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    b.aggregate
        .total_cmp(&a.aggregate)
        .then_with(|| cmp_signal(b.scores.name, a.scores.name))
        .then_with(|| cmp_signal(b.scores.domain, a.scores.domain))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

// Absent sorts below any score.
fn cmp_signal(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Decompose the query URL into a [`PreparedQuery`].
///
/// An unparsable URL is reported to the metrics hook and logged; the query
/// continues without a domain signal.
pub fn prepare_query(entity: &QueryEntity) -> PreparedQuery {
    let domain = match decompose_url(&entity.url) {
        Ok(parts) => Some(parts.domain),
        Err(CanonicalError::EmptyUrl) => None,
        Err(err) => {
            warn!(url = %entity.url, error = %err, "query url skipped");
            if let Some(recorder) = metrics_recorder() {
                recorder.record_unparsable_url(&entity.url, &err);
            }
            None
        }
    };
    PreparedQuery::new(entity.name.clone(), domain)
}

/// Matcher running searches against a [`CandidateSource`].
pub struct Matcher {
    source: Arc<dyn CandidateSource>,
    normalizer: NormalizerConfig,
    config: MatchConfig,
}

impl Matcher {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self::with_config(source, NormalizerConfig::default(), MatchConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn CandidateSource>,
        normalizer: NormalizerConfig,
        config: MatchConfig,
    ) -> Self {
        Self {
            source,
            normalizer,
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NormalizerConfig {
        &self.normalizer
    }

    /// Run a single search and return ordered matches.
    ///
    /// Limit, threshold and signal checks all happen before the candidate
    /// source is queried.
    pub fn search(&self, req: &MatchRequest) -> Result<RankedMatches, MatchError> {
        let start = Instant::now();
        let limit = self.config.resolve_limit(req.limit)?;
        let theta = self.config.resolve_theta(req.theta)?;

        let entity = QueryEntity::new(&req.name, &req.url, &self.normalizer);
        let query = prepare_query(&entity);
        let signals = query.signals();
        if signals.is_empty() {
            return Err(MatchError::NoSignals);
        }

        // Rows without a domain cannot score when only the domain is compared.
        let candidate_query = CandidateQuery::all().with_require_domain(!signals.name);
        let candidates = self.source.candidates(&candidate_query)?;
        let matches = rank(&query, &candidates, limit, theta)?;
        let latency = start.elapsed();

        debug!(
            signals = signals.label(),
            candidates = candidates.len(),
            hits = matches.len(),
            limit,
            theta,
            "search complete"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(signals, latency, matches.len());
        }

        Ok(RankedMatches { signals, matches })
    }
}
