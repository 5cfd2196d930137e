use crate::RegistryError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// One mutation inside a [`RegistryBackend::write_batch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl BatchOp {
    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        BatchOp::Put {
            key: key.into(),
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        BatchOp::Delete { key: key.into() }
    }
}

/// Ordered key-value storage underneath the registry.
///
/// Keys are UTF-8 strings whose prefixes name a table (`company/`, `url/`,
/// `link/` ...), so [`scan_prefix`](RegistryBackend::scan_prefix) must visit
/// entries in ascending key order.
pub trait RegistryBackend: Send + Sync {
    /// Insert or update a key-value pair.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError>;
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError>;
    /// Delete a key-value pair. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), RegistryError>;
    /// Apply puts and deletes atomically, in order.
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), RegistryError>;
    /// Insert or update multiple key-value pairs atomically.
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), RegistryError> {
        self.write_batch(
            entries
                .into_iter()
                .map(|(key, value)| BatchOp::Put { key, value })
                .collect(),
        )
    }
    /// Delete multiple keys atomically.
    fn batch_delete(&self, keys: Vec<String>) -> Result<(), RegistryError> {
        self.write_batch(keys.into_iter().map(|key| BatchOp::Delete { key }).collect())
    }
    /// Visit every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), RegistryError>,
    ) -> Result<(), RegistryError>;
    /// Flush any buffered writes to the backend.
    fn flush(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Selects and builds a backend.
///
/// ```
/// use registry::BackendConfig;
///
/// let ephemeral = BackendConfig::in_memory();
/// let durable = BackendConfig::redb("/data/companies.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Persistent storage in a single redb file at `path`.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// Process-local storage, lost on drop. Used by tests and demos.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend for this configuration.
    pub fn build(&self) -> Result<Box<dyn RegistryBackend>, RegistryError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(RegistryError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory backend: a `BTreeMap` behind a `RwLock`.
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError> {
        self.records
            .write()
            .map_err(|_| RegistryError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        let guard = self
            .records
            .read()
            .map_err(|_| RegistryError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), RegistryError> {
        self.records
            .write()
            .map_err(|_| RegistryError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), RegistryError> {
        // One write lock for the whole batch keeps it atomic for readers.
        let mut guard = self
            .records
            .write()
            .map_err(|_| RegistryError::backend("poisoned lock"))?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    guard.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), RegistryError>,
    ) -> Result<(), RegistryError> {
        let guard = self
            .records
            .read()
            .map_err(|_| RegistryError::backend("poisoned lock"))?;
        for (key, value) in guard.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            visitor(key, value)?;
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;
