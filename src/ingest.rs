//! Batch find-or-create of companies, URLs and their links.

use canonical::{decompose_url, normalize_name, CanonicalError, NormalizerConfig};
use registry::{CompanyRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::MetricsSpan;

/// One company of an insert batch, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyEntry {
    /// Raw company name; normalized before lookup.
    pub name: String,
    /// Account id, only used when the company is created.
    pub account_id: String,
    /// Optional raw URL; a bare domain is accepted.
    #[serde(default)]
    pub url: Option<String>,
}

impl CompanyEntry {
    pub fn new(name: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_id: account_id.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Counts of what a batch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub companies_created: usize,
    pub companies_existing: usize,
    pub urls_created: usize,
    pub links_created: usize,
    /// URLs that could not be decomposed; their companies were still stored.
    pub urls_skipped: usize,
}

/// Errors produced while ingesting a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("entry {index}: name '{name}' is empty after normalization")]
    EmptyName { index: usize, name: String },
    #[error("entry {index}: account_id must not be empty")]
    MissingAccountId { index: usize },
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Store every entry of `entries` in `registry`.
///
/// The whole batch is validated before the first write: an entry whose name
/// normalizes to nothing, or that lacks an account id, rejects the batch.
/// Registry failures after validation stop the batch where they occur.
pub fn ingest_companies(
    registry: &CompanyRegistry,
    entries: &[CompanyEntry],
    cfg: &NormalizerConfig,
) -> Result<IngestReport, IngestError> {
    let span = MetricsSpan::start();
    let result = run_batch(registry, entries, cfg);
    if let Some(span) = span {
        span.record_ingest(entries.len(), result.as_ref());
    }
    result
}

fn run_batch(
    registry: &CompanyRegistry,
    entries: &[CompanyEntry],
    cfg: &NormalizerConfig,
) -> Result<IngestReport, IngestError> {
    let keys = validate_entries(entries, cfg)?;
    let mut report = IngestReport::default();

    for (entry, key) in entries.iter().zip(&keys) {
        let (company, created) = registry.find_or_create_company(key, &entry.account_id)?;
        if created {
            report.companies_created += 1;
        } else {
            report.companies_existing += 1;
        }

        let Some(raw_url) = entry.url.as_deref() else {
            continue;
        };
        let parts = match decompose_url(raw_url) {
            Ok(parts) => parts,
            Err(CanonicalError::EmptyUrl) => continue,
            Err(err) => {
                warn!(company_id = company.id, url = raw_url, error = %err, "ingest url skipped");
                crate::report_unparsable_url(raw_url, &err);
                report.urls_skipped += 1;
                continue;
            }
        };

        let (url, created) = registry.find_or_create_url(&parts.domain, &parts.path)?;
        if created {
            report.urls_created += 1;
        }
        if registry.associate(company.id, url.id)? {
            report.links_created += 1;
        }
    }

    debug!(
        entries = entries.len(),
        companies_created = report.companies_created,
        urls_created = report.urls_created,
        links_created = report.links_created,
        urls_skipped = report.urls_skipped,
        "ingest batch complete"
    );
    Ok(report)
}

fn validate_entries(
    entries: &[CompanyEntry],
    cfg: &NormalizerConfig,
) -> Result<Vec<String>, IngestError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.account_id.trim().is_empty() {
                return Err(IngestError::MissingAccountId { index });
            }
            let key = normalize_name(&entry.name, cfg);
            if key.is_empty() {
                return Err(IngestError::EmptyName {
                    index,
                    name: entry.name.clone(),
                });
            }
            Ok(key)
        })
        .collect()
}
