use std::fmt;
use std::str::FromStr;

use canonical::{normalize_name, NormalizerConfig};
use registry::{CandidateRecord, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A company record as supplied by a caller: normalized name and raw URL.
///
/// Either side may be empty. The URL is decomposed lazily by
/// [`crate::Matcher::search`] so a parse failure can be reported instead of
/// silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    /// Normalized company key, possibly empty.
    pub name: String,
    /// URL exactly as received, possibly empty.
    pub url: String,
}

impl QueryEntity {
    /// Normalize `raw_name` and keep `raw_url` as is.
    pub fn new(raw_name: &str, raw_url: &str, cfg: &NormalizerConfig) -> Self {
        Self {
            name: normalize_name(raw_name, cfg),
            url: raw_url.to_string(),
        }
    }
}

/// Which signals a request compares. Decided once per request from the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedSignals {
    pub name: bool,
    pub domain: bool,
}

impl EvaluatedSignals {
    pub fn is_empty(&self) -> bool {
        !self.name && !self.domain
    }

    /// Short label for logs and metrics: `name`, `domain`, `name+domain` or `none`.
    pub fn label(&self) -> &'static str {
        match (self.name, self.domain) {
            (true, true) => "name+domain",
            (true, false) => "name",
            (false, true) => "domain",
            (false, false) => "none",
        }
    }
}

/// A query ready for scoring: normalized key plus decomposed domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    name: String,
    domain: Option<String>,
    signals: EvaluatedSignals,
}

impl PreparedQuery {
    /// `name` must already be normalized. An empty domain counts as absent.
    pub fn new(name: impl Into<String>, domain: Option<String>) -> Self {
        let name = name.into();
        let domain = domain.filter(|d| !d.is_empty());
        let signals = EvaluatedSignals {
            name: !name.is_empty(),
            domain: domain.is_some(),
        };
        Self {
            name,
            domain,
            signals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn signals(&self) -> EvaluatedSignals {
        self.signals
    }
}

/// Per-signal scores for one query/candidate pair. `None` means absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    /// Trigram similarity of the normalized names, in `[0, 1]`.
    pub name: Option<f64>,
    /// `1.0` on exact domain equality, else `0.0`.
    pub domain: Option<f64>,
}

impl SignalScores {
    /// Mean of the present signals, `None` when none is present.
    pub fn aggregate(&self) -> Option<f64> {
        let present: Vec<f64> = [self.name, self.domain].into_iter().flatten().collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// A candidate that cleared the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub candidate: CandidateRecord,
    pub scores: SignalScores,
    pub aggregate: f64,
}

/// Ordered result of a search, with the signals the request evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedMatches {
    pub signals: EvaluatedSignals,
    pub matches: Vec<RankedMatch>,
}

impl RankedMatches {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Result encoding selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(MatchError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Matcher-wide defaults and bounds.
///
/// `MatchConfig` is serde-friendly so it can be embedded in higher-level
/// configs (see the `matcher` section of the pipeline YAML).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Result count when a request does not give one.
    #[serde(default = "MatchConfig::default_limit")]
    pub default_limit: usize,
    /// Threshold when a request does not give one. Aggregates must be
    /// strictly greater than the threshold to be returned.
    #[serde(default = "MatchConfig::default_theta")]
    pub default_theta: f64,
    /// Optional cap on the limit a request may ask for. Unbounded unless set.
    #[serde(default)]
    pub max_limit: Option<usize>,
}

impl MatchConfig {
    pub(crate) fn default_limit() -> usize {
        10
    }

    pub(crate) fn default_theta() -> f64 {
        0.0
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_limit == Some(0) {
            return Err(MatchError::InvalidConfig(
                "max_limit must be greater than zero".into(),
            ));
        }
        if self.default_limit == 0 {
            return Err(MatchError::InvalidConfig(
                "default_limit must be greater than zero".into(),
            ));
        }
        if let Some(max) = self.max_limit.filter(|&max| self.default_limit > max) {
            return Err(MatchError::InvalidConfig(format!(
                "default_limit {} exceeds max_limit {max}",
                self.default_limit
            )));
        }
        if !self.default_theta.is_finite() {
            return Err(MatchError::InvalidConfig(
                "default_theta must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the effective limit of a request.
    pub fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, MatchError> {
        let limit = requested.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(MatchError::InvalidLimit(
                "limit must be a positive integer".into(),
            ));
        }
        if let Some(max) = self.max_limit.filter(|&max| limit > max) {
            return Err(MatchError::InvalidLimit(format!(
                "limit {limit} exceeds the maximum of {max}"
            )));
        }
        Ok(limit)
    }

    /// Resolve the effective threshold of a request.
    pub fn resolve_theta(&self, requested: Option<f64>) -> Result<f64, MatchError> {
        let theta = requested.unwrap_or(self.default_theta);
        if !theta.is_finite() {
            return Err(MatchError::InvalidTheta(format!("{theta} is not finite")));
        }
        Ok(theta)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit(),
            default_theta: Self::default_theta(),
            max_limit: None,
        }
    }
}

/// A single search against the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Raw company name, normalized by the matcher.
    #[serde(default)]
    pub name: String,
    /// Raw URL; a bare domain is accepted.
    #[serde(default)]
    pub url: String,
    /// Falls back to [`MatchConfig::default_limit`].
    #[serde(default)]
    pub limit: Option<usize>,
    /// Falls back to [`MatchConfig::default_theta`].
    #[serde(default)]
    pub theta: Option<f64>,
}

impl MatchRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = Some(theta);
        self
    }
}

/// Parse a `limit` request parameter: a positive integer.
pub fn parse_limit(raw: &str) -> Result<usize, MatchError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| MatchError::InvalidLimit(format!("'{raw}' is not an integer")))?;
    if value <= 0 {
        return Err(MatchError::InvalidLimit(format!(
            "limit must be positive, got {value}"
        )));
    }
    usize::try_from(value).map_err(|_| MatchError::InvalidLimit(format!("'{raw}' is too large")))
}

/// Parse a `theta` request parameter: a finite float.
pub fn parse_theta(raw: &str) -> Result<f64, MatchError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| MatchError::InvalidTheta(format!("'{raw}' is not a number")))?;
    if !value.is_finite() {
        return Err(MatchError::InvalidTheta(format!("'{raw}' is not finite")));
    }
    Ok(value)
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Neither a usable name nor a usable URL was supplied.
    #[error("name or url query params missing")]
    NoSignals,
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid theta: {0}")]
    InvalidTheta(String),
    /// Output encoding other than `json` or `csv`.
    #[error("invalid request format '{0}': expected json or csv")]
    InvalidFormat(String),
    /// Invalid matcher configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Candidate lookup failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
