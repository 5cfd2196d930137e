use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use corpmatch::{IngestError, MatchError, PipelineError, RegistryError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// HTTP status and stable machine code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Authentication(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ServerError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ServerError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            ServerError::Pipeline(err) => pipeline_status(err),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    pub fn error_code(&self) -> &'static str {
        self.status_and_code().1
    }
}

fn pipeline_status(err: &PipelineError) -> (StatusCode, &'static str) {
    match err {
        PipelineError::Match(err) => match_status(err),
        PipelineError::Registry(err) => registry_status(err),
        PipelineError::Ingest(IngestError::Registry(err)) => registry_status(err),
        PipelineError::Ingest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ENTRY"),
        PipelineError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
    }
}

fn match_status(err: &MatchError) -> (StatusCode, &'static str) {
    match err {
        MatchError::NoSignals => (StatusCode::BAD_REQUEST, "NO_SIGNALS"),
        MatchError::InvalidLimit(_) => (StatusCode::BAD_REQUEST, "INVALID_LIMIT"),
        MatchError::InvalidTheta(_) => (StatusCode::BAD_REQUEST, "INVALID_THETA"),
        MatchError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "INVALID_FORMAT"),
        MatchError::InvalidConfig(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        MatchError::Registry(err) => registry_status(err),
    }
}

fn registry_status(err: &RegistryError) -> (StatusCode, &'static str) {
    match err {
        RegistryError::CompanyNotFound(_) | RegistryError::UrlNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        RegistryError::DuplicateKey(_) => (StatusCode::CONFLICT, "DUPLICATE_KEY"),
        RegistryError::EmptyKey | RegistryError::EmptyDomain => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ENTRY")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRY_ERROR"),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<MatchError> for ServerError {
    fn from(err: MatchError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

impl From<RegistryError> for ServerError {
    fn from(err: RegistryError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
