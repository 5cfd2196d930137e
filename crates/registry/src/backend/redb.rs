//! redb backend for persistent registry storage.
//!
//! One table maps string keys to byte values; every write is its own ACID
//! transaction and batches share one transaction.
//!
//! ```yaml
//! registry:
//!   backend: "redb"
//!   path: "/data/companies.redb"
//! ```

use crate::{BatchOp, RegistryBackend, RegistryError};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const REGISTRY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("corpmatch_registry");

/// Persistent backend on a redb database file.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create the database at `path`, creating the table if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let db = Database::create(path).map_err(RegistryError::backend)?;

        let write_txn = db.begin_write().map_err(RegistryError::backend)?;
        {
            // Opening the table inside a write transaction creates it.
            let _table = write_txn
                .open_table(REGISTRY_TABLE)
                .map_err(RegistryError::backend)?;
        }
        write_txn.commit().map_err(RegistryError::backend)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl RegistryBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError> {
        self.batch_put(vec![(key.to_string(), value.to_vec())])
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        let read_txn = self.db.begin_read().map_err(RegistryError::backend)?;
        let table = read_txn
            .open_table(REGISTRY_TABLE)
            .map_err(RegistryError::backend)?;

        let value = table.get(key).map_err(RegistryError::backend)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), RegistryError> {
        self.batch_delete(vec![key.to_string()])
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), RegistryError> {
        let write_txn = self.db.begin_write().map_err(RegistryError::backend)?;
        {
            let mut table = write_txn
                .open_table(REGISTRY_TABLE)
                .map_err(RegistryError::backend)?;
            for op in &ops {
                match op {
                    BatchOp::Put { key, value } => {
                        table
                            .insert(key.as_str(), value.as_slice())
                            .map_err(RegistryError::backend)?;
                    }
                    BatchOp::Delete { key } => {
                        table
                            .remove(key.as_str())
                            .map_err(RegistryError::backend)?;
                    }
                }
            }
        }
        // Dropping an uncommitted transaction aborts it.
        write_txn.commit().map_err(RegistryError::backend)?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), RegistryError>,
    ) -> Result<(), RegistryError> {
        let read_txn = self.db.begin_read().map_err(RegistryError::backend)?;
        let table = read_txn
            .open_table(REGISTRY_TABLE)
            .map_err(RegistryError::backend)?;

        for item in table.range(prefix..).map_err(RegistryError::backend)? {
            let (key, value) = item.map_err(RegistryError::backend)?;
            if !key.value().starts_with(prefix) {
                break;
            }
            visitor(key.value(), value.value())?;
        }
        Ok(())
    }
}
