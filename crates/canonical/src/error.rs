use thiserror::Error;

/// Reasons a raw URL could not be decomposed into a domain and path.
///
/// All variants are recoverable: a search treats the domain signal as absent
/// and ingestion skips the URL for that record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("url is empty")]
    EmptyUrl,
    #[error("cannot parse url {input:?}: {reason}")]
    UnparsableUrl { input: String, reason: String },
    #[error("url {input:?} has no host")]
    MissingHost { input: String },
}
