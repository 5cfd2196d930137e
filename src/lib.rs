//! Workspace umbrella crate for corpmatch.
//!
//! This crate stitches the registry, the canonicalizer and the matcher into
//! one [`Pipeline`] so callers can search and ingest company records through a
//! single API entry point. Request parameters arrive as strings
//! ([`SearchParams`]) and are validated here before any registry access.
//!
//! ```
//! use corpmatch::{CompanyEntry, EncodedMatches, Pipeline, SearchParams};
//!
//! let pipeline = Pipeline::in_memory();
//! pipeline
//!     .ingest(&[CompanyEntry::new("Acme, Inc.", "A1").with_url("acme.com")])
//!     .unwrap();
//!
//! let params = SearchParams {
//!     name: Some("ACME Corporation".into()),
//!     format: Some("csv".into()),
//!     ..SearchParams::default()
//! };
//! let EncodedMatches::Text(csv) = pipeline.search(&params).unwrap() else {
//!     unreachable!("csv was requested");
//! };
//! assert!(csv.ends_with("1,A1,acme,acme.com,1.0,1.0,\n"));
//! ```

mod config;
mod ingest;

pub use crate::config::{ConfigLoadError, CorpmatchConfig, MatchYamlConfig, RegistryYamlConfig};
pub use crate::ingest::{ingest_companies, CompanyEntry, IngestError, IngestReport};
pub use canonical::{
    collapse_whitespace, complete_scheme, corporate_suffixes, decompose_url,
    is_corporate_suffix, normalize_name, CanonicalError, DomainPath, NormalizerConfig,
};
pub use matcher::{
    encode, parse_limit, parse_theta, set_match_metrics, CandidateSource, EncodedMatches,
    EvaluatedSignals, MatchConfig, MatchError, MatchMetrics, MatchRequest, Matcher, OutputFormat,
    RankedMatch, RankedMatches, StructuredMatches,
};
pub use registry::{
    BackendConfig, CandidateQuery, CandidateRecord, CompanyPatch, CompanyRecord, CompanyRegistry,
    RegistryConfig, RegistryError, RegistryStats, UrlRecord,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that can occur while searching or writing through the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    Match(MatchError),
    Registry(RegistryError),
    Ingest(IngestError),
    Config(ConfigLoadError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Match(err) => write!(f, "match failure: {err}"),
            PipelineError::Registry(err) => write!(f, "registry failure: {err}"),
            PipelineError::Ingest(err) => write!(f, "ingest failure: {err}"),
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Match(err) => Some(err),
            PipelineError::Registry(err) => Some(err),
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Config(err) => Some(err),
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<RegistryError> for PipelineError {
    fn from(value: RegistryError) -> Self {
        PipelineError::Registry(value)
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

/// Metrics observer for pipeline writes.
pub trait PipelineMetrics: Send + Sync {
    /// Record the outcome of an ingest batch of `entries` companies.
    fn record_ingest(
        &self,
        latency: Duration,
        entries: usize,
        result: Result<&IngestReport, &IngestError>,
    );

    /// Record an ingested URL that could not be decomposed.
    fn record_unparsable_url(&self, _raw: &str, _error: &CanonicalError) {}
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("pipeline metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) fn report_unparsable_url(raw: &str, error: &CanonicalError) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_unparsable_url(raw, error);
    }
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_ingest(
        self,
        entries: usize,
        result: Result<&IngestReport, &IngestError>,
    ) {
        self.recorder
            .record_ingest(self.start.elapsed(), entries, result);
    }
}

/// Search parameters exactly as they arrive on a request, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub theta: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl SearchParams {
    /// Parse limit, theta and format. Name and URL are checked by the matcher.
    pub fn parse(&self) -> Result<(MatchRequest, OutputFormat), MatchError> {
        let mut request = MatchRequest::new(
            self.name.clone().unwrap_or_default(),
            self.url.clone().unwrap_or_default(),
        );
        request.limit = self.limit.as_deref().map(parse_limit).transpose()?;
        request.theta = self.theta.as_deref().map(parse_theta).transpose()?;
        let format = self
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()?
            .unwrap_or_default();
        Ok((request, format))
    }
}

/// Validate `params`, run the search and encode the result.
pub fn search_companies(
    matcher: &Matcher,
    params: &SearchParams,
) -> Result<EncodedMatches, PipelineError> {
    let (request, format) = params.parse()?;
    let ranked = matcher.search(&request)?;
    Ok(encode(&ranked, format))
}

/// Registry plus matcher, configured together.
pub struct Pipeline {
    registry: Arc<CompanyRegistry>,
    matcher: Matcher,
    normalizer: NormalizerConfig,
}

impl Pipeline {
    /// Open the configured registry and build a matcher over it.
    pub fn from_config(cfg: &CorpmatchConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let registry = CompanyRegistry::open(cfg.registry_config())?;
        Ok(Self::with_registry(Arc::new(registry), cfg))
    }

    /// Pipeline over an existing registry handle.
    pub fn with_registry(registry: Arc<CompanyRegistry>, cfg: &CorpmatchConfig) -> Self {
        let normalizer = cfg.normalizer_config();
        let matcher = Matcher::with_config(registry.clone(), normalizer, cfg.match_config());
        Self {
            registry,
            matcher,
            normalizer,
        }
    }

    /// In-memory registry with default settings.
    pub fn in_memory() -> Self {
        Self::with_registry(
            Arc::new(CompanyRegistry::in_memory()),
            &CorpmatchConfig::default(),
        )
    }

    pub fn registry(&self) -> &Arc<CompanyRegistry> {
        &self.registry
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn normalizer(&self) -> &NormalizerConfig {
        &self.normalizer
    }

    /// Search with request-style string parameters.
    pub fn search(&self, params: &SearchParams) -> Result<EncodedMatches, PipelineError> {
        search_companies(&self.matcher, params)
    }

    /// Search with already-typed parameters.
    pub fn search_ranked(&self, request: &MatchRequest) -> Result<RankedMatches, PipelineError> {
        Ok(self.matcher.search(request)?)
    }

    pub fn ingest(&self, entries: &[CompanyEntry]) -> Result<IngestReport, PipelineError> {
        Ok(ingest_companies(&self.registry, entries, &self.normalizer)?)
    }

    /// Company and its URLs, `None` when unknown.
    pub fn company(
        &self,
        id: u64,
    ) -> Result<Option<(CompanyRecord, Vec<UrlRecord>)>, PipelineError> {
        match self.registry.company(id)? {
            Some(company) => {
                let urls = self.registry.urls_for(id)?;
                Ok(Some((company, urls)))
            }
            None => Ok(None),
        }
    }

    /// Update a company. A new raw name is normalized before it is stored.
    pub fn update_company(
        &self,
        id: u64,
        raw_name: Option<&str>,
        account_id: Option<&str>,
    ) -> Result<CompanyRecord, PipelineError> {
        let patch = CompanyPatch {
            name: raw_name.map(|raw| normalize_name(raw, &self.normalizer)),
            account_id: account_id.map(str::to_string),
        };
        Ok(self.registry.update_company(id, patch)?)
    }

    pub fn delete_company(&self, id: u64) -> Result<CompanyRecord, PipelineError> {
        Ok(self.registry.delete_company(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn params(name: &str, url: &str) -> SearchParams {
        SearchParams {
            name: Some(name.into()),
            url: Some(url.into()),
            ..SearchParams::default()
        }
    }

    #[test]
    fn search_params_defaults() {
        let (request, format) = SearchParams::default().parse().unwrap();
        assert_eq!(request, MatchRequest::default());
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn search_params_reject_bad_values() {
        let bad_limit = SearchParams {
            limit: Some("many".into()),
            ..params("acme", "")
        };
        assert!(matches!(bad_limit.parse(), Err(MatchError::InvalidLimit(_))));

        let bad_theta = SearchParams {
            theta: Some("high".into()),
            ..params("acme", "")
        };
        assert!(matches!(bad_theta.parse(), Err(MatchError::InvalidTheta(_))));

        let bad_format = SearchParams {
            format: Some("xml".into()),
            ..params("acme", "")
        };
        assert!(matches!(bad_format.parse(), Err(MatchError::InvalidFormat(_))));
    }

    #[test]
    fn pipeline_search_round_trip() {
        let pipeline = Pipeline::in_memory();
        pipeline
            .ingest(&[
                CompanyEntry::new("Acme Inc", "A1").with_url("acme.com"),
                CompanyEntry::new("Globex", "A2"),
            ])
            .unwrap();

        let encoded = pipeline.search(&params("acme", "www.acme.com")).unwrap();
        let EncodedMatches::Structured(doc) = encoded else {
            panic!("json is the default format");
        };
        assert_eq!(doc.matches.len(), 1);
        assert_eq!(doc.matches[0].account_id, "A1");
        assert_eq!(doc.matches[0].score.average, 1.0);
    }

    #[test]
    fn update_normalizes_new_name() {
        let pipeline = Pipeline::in_memory();
        pipeline.ingest(&[CompanyEntry::new("Acme", "A1")]).unwrap();
        let acme = pipeline.registry().company_by_key("acme").unwrap().unwrap();

        let updated = pipeline
            .update_company(acme.id, Some("Acme Widgets, Ltd."), None)
            .unwrap();
        assert_eq!(updated.name, "acme widgets");
        assert_eq!(updated.account_id, "A1");

        let err = pipeline
            .update_company(acme.id, Some("Inc."), None)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Registry(RegistryError::EmptyKey)
        ));
    }

    struct CountingMetrics {
        events: Mutex<Vec<String>>,
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_ingest(
            &self,
            _latency: Duration,
            entries: usize,
            result: Result<&IngestReport, &IngestError>,
        ) {
            let tag = if result.is_ok() { "ok" } else { "err" };
            self.events
                .lock()
                .unwrap()
                .push(format!("ingest:{entries}:{tag}"));
        }

        fn record_unparsable_url(&self, raw: &str, _error: &CanonicalError) {
            self.events.lock().unwrap().push(format!("url:{raw}"));
        }
    }

    #[test]
    fn metrics_recorder_tracks_ingest_outcome() {
        let metrics = Arc::new(CountingMetrics {
            events: Mutex::new(Vec::new()),
        });
        set_pipeline_metrics(Some(metrics.clone()));

        let pipeline = Pipeline::in_memory();
        pipeline
            .ingest(&[CompanyEntry::new("Metrics Co", "M1").with_url("http://metrics [co")])
            .unwrap();

        set_pipeline_metrics(None);

        let events = metrics.events.lock().unwrap().clone();
        assert!(events.contains(&"url:http://metrics [co".to_string()));
        assert!(events.contains(&"ingest:1:ok".to_string()));
    }
}
