//! # Company matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers one question: which companies already in the registry
//! look like this incoming record? It normalizes the query with `canonical`,
//! fetches candidate rows from a [`CandidateSource`] (usually the
//! `registry` crate), scores every row, and returns the best matches above a
//! threshold in one of two encodings.
//!
//! ## Signals
//!
//! - **name**: trigram similarity between normalized keys, in `[0, 1]`.
//! - **domain**: `1.0` when the decomposed query domain equals the row's
//!   domain, else `0.0`.
//!
//! A signal is *absent* rather than zero when either side lacks the input.
//! The aggregate score is the plain mean of the present signals; weights are
//! fixed.
//!
//! ## Core Types
//!
//! - [`MatchRequest`]: raw name, raw URL, optional limit and threshold.
//! - [`MatchConfig`]: default limit, default threshold, maximum limit.
//! - [`RankedMatches`]: ordered [`RankedMatch`] values plus the
//!   [`EvaluatedSignals`] of the request, which the encoders need.
//! - [`Matcher`]: validates, prepares the query, fetches, ranks and reports
//!   metrics.
//! - [`encode`]: renders results as [`EncodedMatches::Structured`] (JSON
//!   shaped) or [`EncodedMatches::Text`] (comma separated).
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use matcher::{encode, MatchRequest, Matcher, OutputFormat};
//! use registry::CompanyRegistry;
//!
//! let registry = CompanyRegistry::in_memory();
//! let (acme, _) = registry.find_or_create_company("acme", "acct-1").unwrap();
//! let (url, _) = registry.find_or_create_url("acme.com", "").unwrap();
//! registry.associate(acme.id, url.id).unwrap();
//!
//! let matcher = Matcher::new(Arc::new(registry));
//! let result = matcher
//!     .search(&MatchRequest::new("ACME, Inc.", "www.acme.com").with_limit(5))
//!     .unwrap();
//! assert_eq!(result.matches[0].aggregate, 1.0);
//!
//! let csv = encode(&result, OutputFormat::Csv);
//! println!("{csv:?}");
//! ```

mod encode;
mod engine;
mod metrics;
mod similarity;
mod source;
mod types;

pub use crate::encode::{
    encode, encode_structured, encode_text, round3, EncodedMatches, StructuredMatch,
    StructuredMatches, StructuredScore, TEXT_HEADER,
};
pub use crate::engine::{prepare_query, rank, score, Matcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::similarity::{trigram_similarity, trigrams};
pub use crate::source::CandidateSource;
pub use crate::types::{
    parse_limit, parse_theta, EvaluatedSignals, MatchConfig, MatchError, MatchRequest,
    OutputFormat, PreparedQuery, QueryEntity, RankedMatch, RankedMatches, SignalScores,
};
pub use registry::{CandidateQuery, CandidateRecord};
