//! corpmatch server - HTTP REST API for company record matching
//!
//! Exposes registry search and maintenance over HTTP:
//!
//! - **Search**: rank registry companies against a raw name and/or URL and
//!   return them as JSON or CSV
//! - **Registry maintenance**: batch find-or-create, lookup, update, delete
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! Requests authenticate with an API key (`X-API-Key` or
//! `Authorization: Bearer`). Any configured key may read; writes need a key
//! listed in `writer_keys`. Each key is rate limited per minute.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `GET /api/v1/companies?name=&url=&limit=&theta=&format=` - Search
//! - `POST /api/v1/companies` - Batch insert (writer key)
//! - `GET /api/v1/companies/{id}` - Company with its URLs
//! - `PATCH /api/v1/companies/{id}` - Update name or account id (writer key)
//! - `DELETE /api/v1/companies/{id}` - Delete (writer key)
//! - `GET /api/v1/metadata` - Server metadata
//!
//! Errors are returned as `{"error": {"code": "...", "message": "..."}}`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
