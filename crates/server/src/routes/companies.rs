use crate::error::{ServerError, ServerResult};
use crate::middleware::ApiKey;
use crate::state::ServerState;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use corpmatch::{CompanyEntry, CompanyRecord, EncodedMatches, IngestReport, SearchParams, UrlRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Batch insert body
#[derive(Debug, Deserialize)]
pub struct InsertCompaniesRequest {
    pub companies: Vec<CompanyEntry>,
}

#[derive(Debug, Serialize)]
pub struct InsertCompaniesResponse {
    pub status: String,
    pub report: IngestReport,
}

/// Partial update body; at least one field must be set
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    /// Raw name, normalized before it is stored
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// A company with its associated URLs
#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub id: u64,
    pub account_id: String,
    pub name: String,
    pub urls: Vec<UrlRecord>,
}

impl CompanyResponse {
    fn new(company: CompanyRecord, urls: Vec<UrlRecord>) -> Self {
        Self {
            id: company.id,
            account_id: company.account_id,
            name: company.name,
            urls,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteCompanyResponse {
    pub status: String,
    pub company: CompanyRecord,
}

fn require_writer(state: &ServerState, key: &ApiKey) -> ServerResult<()> {
    if state.is_writer_key(&key.0) {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "this API key may not modify the registry".to_string(),
        ))
    }
}

/// Search the registry for companies resembling `name` and/or `url`
///
/// `limit`, `theta` and `format` arrive as raw strings and are validated
/// before the registry is read. The scan runs on the blocking pool.
pub async fn search_companies(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Response> {
    let pipeline = state.pipeline.clone();
    let encoded = tokio::task::spawn_blocking(move || pipeline.search(&params))
        .await
        .map_err(|err| ServerError::Internal(format!("search task failed: {err}")))??;
    let content_type = encoded.content_type();
    Ok(match encoded {
        EncodedMatches::Structured(doc) => Json(doc).into_response(),
        EncodedMatches::Text(text) => ([(CONTENT_TYPE, content_type)], text).into_response(),
    })
}

/// Find-or-create every company of the batch, with its URL
pub async fn insert_companies(
    State(state): State<Arc<ServerState>>,
    Extension(key): Extension<ApiKey>,
    Json(request): Json<InsertCompaniesRequest>,
) -> ServerResult<impl IntoResponse> {
    require_writer(&state, &key)?;

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || pipeline.ingest(&request.companies))
        .await
        .map_err(|err| ServerError::Internal(format!("ingest task failed: {err}")))??;

    tracing::info!(
        companies_created = report.companies_created,
        urls_created = report.urls_created,
        links_created = report.links_created,
        "companies inserted"
    );

    Ok(Json(InsertCompaniesResponse {
        status: "success".to_string(),
        report,
    }))
}

/// Company by id, with its URLs
pub async fn get_company(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> ServerResult<Json<CompanyResponse>> {
    let (company, urls) = state.pipeline.company(id)?.ok_or(ServerError::NotFound)?;
    Ok(Json(CompanyResponse::new(company, urls)))
}

pub async fn update_company(
    State(state): State<Arc<ServerState>>,
    Extension(key): Extension<ApiKey>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateCompanyRequest>,
) -> ServerResult<Json<CompanyResponse>> {
    require_writer(&state, &key)?;
    if request.name.is_none() && request.account_id.is_none() {
        return Err(ServerError::BadRequest(
            "provide 'name' and/or 'account_id'".to_string(),
        ));
    }

    let company = state.pipeline.update_company(
        id,
        request.name.as_deref(),
        request.account_id.as_deref(),
    )?;
    let urls = state.pipeline.registry().urls_for(id)?;
    Ok(Json(CompanyResponse::new(company, urls)))
}

/// Delete a company and its URL links; URL records stay
pub async fn delete_company(
    State(state): State<Arc<ServerState>>,
    Extension(key): Extension<ApiKey>,
    Path(id): Path<u64>,
) -> ServerResult<Json<DeleteCompanyResponse>> {
    require_writer(&state, &key)?;
    let company = state.pipeline.delete_company(id)?;
    Ok(Json(DeleteCompanyResponse {
        status: "deleted".to_string(),
        company,
    }))
}
