//! # Company registry
//!
//! Storage for the records the matcher ranks against: companies keyed by their
//! normalized name, URLs keyed by domain, and the links between them.
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: every table lives in one ordered key-value store
//!   behind the [`RegistryBackend`] trait. Out of the box:
//!   - an in-memory `BTreeMap` backend for tests and ephemeral deployments;
//!   - a redb backend for persistent, on-disk storage (`backend-redb` feature).
//! - **Find-or-create writes**: [`CompanyRegistry::find_or_create_company`] and
//!   [`CompanyRegistry::find_or_create_url`] are atomic with respect to each
//!   other; concurrent ingests of the same key produce one record.
//! - **Candidate rows**: [`CompanyRegistry::candidates`] returns the outer join
//!   of companies and their URLs, which is what the matcher scores.
//!
//! ## Key layout
//!
//! | Prefix | Value |
//! |--------|-------|
//! | `company/{id:020}` | bincode [`CompanyRecord`] |
//! | `company_key/{key}` | company id (big endian) |
//! | `url/{id:020}` | bincode [`UrlRecord`] |
//! | `url_domain/{domain}` | url id (big endian) |
//! | `link/{company:020}/{url:020}` | empty |
//! | `meta/...` | id counters and schema version |
//!
//! Ids are zero padded so a prefix scan visits records in id order.
//!
//! ## Example Usage
//!
//! ```
//! use registry::{CandidateQuery, CompanyRegistry};
//!
//! let registry = CompanyRegistry::in_memory();
//! let (acme, created) = registry.find_or_create_company("acme", "acct-1").unwrap();
//! assert!(created);
//!
//! let (url, _) = registry.find_or_create_url("acme.com", "/about").unwrap();
//! registry.associate(acme.id, url.id).unwrap();
//!
//! let rows = registry.candidates(&CandidateQuery::all()).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].domain.as_deref(), Some("acme.com"));
//! ```

mod backend;
mod query;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, BatchOp, InMemoryBackend, RegistryBackend};
pub use query::{CandidateQuery, CandidateRecord};

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Bump this value whenever the stored record layout changes.
pub const REGISTRY_SCHEMA_VERSION: u16 = 1;

const COMPANY_PREFIX: &str = "company/";
const COMPANY_KEY_PREFIX: &str = "company_key/";
const URL_PREFIX: &str = "url/";
const URL_DOMAIN_PREFIX: &str = "url_domain/";
const LINK_PREFIX: &str = "link/";
const NEXT_COMPANY_ID: &str = "meta/next_company_id";
const NEXT_URL_ID: &str = "meta/next_url_id";
const SCHEMA_VERSION_KEY: &str = "meta/schema_version";

/// A known company. `name` is the normalized key and doubles as display name.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: u64,
    pub account_id: String,
    pub name: String,
}

/// A known URL, identified by its domain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: u64,
    pub domain: String,
    pub path: String,
}

/// Partial update for [`CompanyRegistry::update_company`].
///
/// `name` must already be normalized by the caller.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub account_id: Option<String>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.account_id.is_none()
    }
}

/// Record counts, as reported by [`CompanyRegistry::stats`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub companies: u64,
    pub urls: u64,
    pub links: u64,
}

/// Config for opening a registry.
#[derive(Clone, Debug, Default)]
pub struct RegistryConfig {
    /// Backend storage configuration (in-memory or redb).
    pub backend: BackendConfig,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }
}

/// Registry error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("company {0} not found")]
    CompanyNotFound(u64),
    #[error("url {0} not found")]
    UrlNotFound(u64),
    #[error("a company with key '{0}' already exists")]
    DuplicateKey(String),
    #[error("company key must not be empty")]
    EmptyKey,
    #[error("url domain must not be empty")]
    EmptyDomain,
    #[error("stored schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u16, expected: u16 },
}

impl From<EncodeError> for RegistryError {
    fn from(e: EncodeError) -> Self {
        RegistryError::Encode(e.to_string())
    }
}

impl From<DecodeError> for RegistryError {
    fn from(e: DecodeError) -> Self {
        RegistryError::Decode(e.to_string())
    }
}

impl RegistryError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Company registry over a [`RegistryBackend`].
pub struct CompanyRegistry {
    backend: Box<dyn RegistryBackend>,
    cfg: RegistryConfig,
    /// Serializes every read-modify-write sequence.
    writer: Mutex<()>,
}

impl CompanyRegistry {
    /// Open a registry using the configured backend.
    pub fn open(cfg: RegistryConfig) -> Result<Self, RegistryError> {
        let backend = cfg.backend.build()?;
        Self::with_backend(cfg, backend)
    }

    /// Ephemeral registry, mostly for tests.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(InMemoryBackend::new()),
            cfg: RegistryConfig::default(),
            writer: Mutex::new(()),
        }
    }

    /// Build a registry over a custom backend.
    ///
    /// Fails when the backend holds records written with another schema version.
    pub fn with_backend(
        cfg: RegistryConfig,
        backend: Box<dyn RegistryBackend>,
    ) -> Result<Self, RegistryError> {
        match backend.get(SCHEMA_VERSION_KEY)? {
            Some(raw) => {
                let found = decode_u16(&raw)?;
                if found != REGISTRY_SCHEMA_VERSION {
                    return Err(RegistryError::SchemaMismatch {
                        found,
                        expected: REGISTRY_SCHEMA_VERSION,
                    });
                }
            }
            None => backend.put(SCHEMA_VERSION_KEY, &REGISTRY_SCHEMA_VERSION.to_be_bytes())?,
        }

        Ok(Self {
            backend,
            cfg,
            writer: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    /// Return the company stored under `key`, creating it with `account_id`
    /// when missing. The account id of an existing company is left untouched.
    pub fn find_or_create_company(
        &self,
        key: &str,
        account_id: &str,
    ) -> Result<(CompanyRecord, bool), RegistryError> {
        if key.is_empty() {
            return Err(RegistryError::EmptyKey);
        }
        let _guard = self.lock_writer()?;

        if let Some(existing) = self.company_by_key(key)? {
            return Ok((existing, false));
        }

        let id = self.next_id(NEXT_COMPANY_ID)?;
        let record = CompanyRecord {
            id,
            account_id: account_id.to_string(),
            name: key.to_string(),
        };
        self.backend.batch_put(vec![
            (company_key(id), encode(&record)?),
            (company_key_index(key), id.to_be_bytes().to_vec()),
            (NEXT_COMPANY_ID.to_string(), (id + 1).to_be_bytes().to_vec()),
        ])?;
        debug!(company_id = id, key, "company created");
        Ok((record, true))
    }

    /// Return the URL stored for `domain`, creating it with `path` when missing.
    ///
    /// Lookup is by domain only: the path of an existing record is not changed.
    pub fn find_or_create_url(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<(UrlRecord, bool), RegistryError> {
        if domain.is_empty() {
            return Err(RegistryError::EmptyDomain);
        }
        let _guard = self.lock_writer()?;

        if let Some(existing) = self.url_by_domain(domain)? {
            return Ok((existing, false));
        }

        let id = self.next_id(NEXT_URL_ID)?;
        let record = UrlRecord {
            id,
            domain: domain.to_string(),
            path: path.to_string(),
        };
        self.backend.batch_put(vec![
            (url_key(id), encode(&record)?),
            (url_domain_index(domain), id.to_be_bytes().to_vec()),
            (NEXT_URL_ID.to_string(), (id + 1).to_be_bytes().to_vec()),
        ])?;
        debug!(url_id = id, domain, "url created");
        Ok((record, true))
    }

    /// Link a company to a URL. Returns `false` when the link already existed.
    pub fn associate(&self, company_id: u64, url_id: u64) -> Result<bool, RegistryError> {
        let _guard = self.lock_writer()?;

        if self.company(company_id)?.is_none() {
            return Err(RegistryError::CompanyNotFound(company_id));
        }
        if self.url(url_id)?.is_none() {
            return Err(RegistryError::UrlNotFound(url_id));
        }

        let key = link_key(company_id, url_id);
        if self.backend.get(&key)?.is_some() {
            return Ok(false);
        }
        self.backend.put(&key, &[])?;
        Ok(true)
    }

    pub fn company(&self, id: u64) -> Result<Option<CompanyRecord>, RegistryError> {
        self.backend
            .get(&company_key(id))?
            .map(|raw| decode(&raw))
            .transpose()
    }

    pub fn company_by_key(&self, key: &str) -> Result<Option<CompanyRecord>, RegistryError> {
        match self.backend.get(&company_key_index(key))? {
            Some(raw) => self.company(decode_u64(&raw)?),
            None => Ok(None),
        }
    }

    pub fn url(&self, id: u64) -> Result<Option<UrlRecord>, RegistryError> {
        self.backend
            .get(&url_key(id))?
            .map(|raw| decode(&raw))
            .transpose()
    }

    pub fn url_by_domain(&self, domain: &str) -> Result<Option<UrlRecord>, RegistryError> {
        match self.backend.get(&url_domain_index(domain))? {
            Some(raw) => self.url(decode_u64(&raw)?),
            None => Ok(None),
        }
    }

    /// URLs linked to `company_id`, in url id order.
    pub fn urls_for(&self, company_id: u64) -> Result<Vec<UrlRecord>, RegistryError> {
        let mut urls = Vec::new();
        for url_id in self.linked_url_ids(company_id)? {
            if let Some(url) = self.url(url_id)? {
                urls.push(url);
            }
        }
        Ok(urls)
    }

    /// Apply `patch` to the company `id` and return the updated record.
    pub fn update_company(
        &self,
        id: u64,
        patch: CompanyPatch,
    ) -> Result<CompanyRecord, RegistryError> {
        let _guard = self.lock_writer()?;

        let mut record = self
            .company(id)?
            .ok_or(RegistryError::CompanyNotFound(id))?;
        let mut ops = Vec::new();

        if let Some(name) = patch.name {
            if name.is_empty() {
                return Err(RegistryError::EmptyKey);
            }
            if name != record.name {
                if self.backend.get(&company_key_index(&name))?.is_some() {
                    return Err(RegistryError::DuplicateKey(name));
                }
                ops.push(BatchOp::delete(company_key_index(&record.name)));
                ops.push(BatchOp::put(
                    company_key_index(&name),
                    id.to_be_bytes().to_vec(),
                ));
                record.name = name;
            }
        }
        if let Some(account_id) = patch.account_id {
            record.account_id = account_id;
        }

        ops.push(BatchOp::put(company_key(id), encode(&record)?));
        // Key swap and record land in one transaction.
        self.backend.write_batch(ops)?;
        debug!(company_id = id, "company updated");
        Ok(record)
    }

    /// Delete a company and its links. URL records are kept.
    pub fn delete_company(&self, id: u64) -> Result<CompanyRecord, RegistryError> {
        let _guard = self.lock_writer()?;

        let record = self
            .company(id)?
            .ok_or(RegistryError::CompanyNotFound(id))?;
        let mut keys = vec![company_key(id), company_key_index(&record.name)];
        keys.extend(
            self.linked_url_ids(id)?
                .into_iter()
                .map(|url_id| link_key(id, url_id)),
        );
        self.backend.batch_delete(keys)?;
        debug!(company_id = id, "company deleted");
        Ok(record)
    }

    /// Every company in id order.
    pub fn companies(&self) -> Result<Vec<CompanyRecord>, RegistryError> {
        let mut out: Vec<CompanyRecord> = Vec::new();
        self.backend.scan_prefix(COMPANY_PREFIX, &mut |_, raw| {
            out.push(decode(raw)?);
            Ok(())
        })?;
        Ok(out)
    }

    pub fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let mut stats = RegistryStats::default();
        self.backend.scan_prefix(COMPANY_PREFIX, &mut |_, _| {
            stats.companies += 1;
            Ok(())
        })?;
        self.backend.scan_prefix(URL_PREFIX, &mut |_, _| {
            stats.urls += 1;
            Ok(())
        })?;
        self.backend.scan_prefix(LINK_PREFIX, &mut |_, _| {
            stats.links += 1;
            Ok(())
        })?;
        Ok(stats)
    }

    /// Flush backend buffers if supported.
    pub fn flush(&self) -> Result<(), RegistryError> {
        self.backend.flush()
    }

    fn linked_url_ids(&self, company_id: u64) -> Result<Vec<u64>, RegistryError> {
        let prefix = format!("{LINK_PREFIX}{company_id:020}/");
        let mut ids = Vec::new();
        self.backend.scan_prefix(&prefix, &mut |key, _| {
            let raw = &key[prefix.len()..];
            let id = raw
                .parse::<u64>()
                .map_err(|e| RegistryError::Decode(format!("link key '{key}': {e}")))?;
            ids.push(id);
            Ok(())
        })?;
        Ok(ids)
    }

    fn next_id(&self, counter: &str) -> Result<u64, RegistryError> {
        match self.backend.get(counter)? {
            Some(raw) => decode_u64(&raw),
            None => Ok(1),
        }
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>, RegistryError> {
        self.writer
            .lock()
            .map_err(|_| RegistryError::backend("poisoned lock"))
    }
}

fn company_key(id: u64) -> String {
    format!("{COMPANY_PREFIX}{id:020}")
}

fn company_key_index(key: &str) -> String {
    format!("{COMPANY_KEY_PREFIX}{key}")
}

fn url_key(id: u64) -> String {
    format!("{URL_PREFIX}{id:020}")
}

fn url_domain_index(domain: &str) -> String {
    format!("{URL_DOMAIN_PREFIX}{domain}")
}

fn link_key(company_id: u64, url_id: u64) -> String {
    format!("{LINK_PREFIX}{company_id:020}/{url_id:020}")
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RegistryError> {
    Ok(encode_to_vec(value, standard())?)
}

fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, RegistryError> {
    let (value, _) = decode_from_slice(raw, standard())?;
    Ok(value)
}

fn decode_u64(raw: &[u8]) -> Result<u64, RegistryError> {
    let bytes: [u8; 8] = raw
        .try_into()
        .map_err(|_| RegistryError::Decode(format!("expected 8 bytes, got {}", raw.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_u16(raw: &[u8]) -> Result<u16, RegistryError> {
    let bytes: [u8; 2] = raw
        .try_into()
        .map_err(|_| RegistryError::Decode(format!("expected 2 bytes, got {}", raw.len())))?;
    Ok(u16::from_be_bytes(bytes))
}
