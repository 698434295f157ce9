//! Human-readable descriptions keyed by identity ID.
//!
//! The key space is the index's: only IDs minted by
//! [`EmbeddingIndex`](facekeep_vecstore::EmbeddingIndex) are ever stored.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::info;

use crate::FaceIdError;

const TABLE: TableDefinition<u64, &str> = TableDefinition::new("descriptions");

/// Description store trait.
///
/// Implementations must be safe for concurrent use.
pub trait DescriptionStore: Send + Sync {
    /// Get the description of an identity.
    fn get(&self, id: u64) -> Result<Option<String>, FaceIdError>;

    /// Store the description of an identity, replacing any previous one.
    fn add(&self, id: u64, description: &str) -> Result<(), FaceIdError>;

    /// Replace an existing description. Returns false if `id` has none.
    fn update(&self, id: u64, description: &str) -> Result<bool, FaceIdError>;

    /// Report whether `id` has a description.
    fn contains(&self, id: u64) -> Result<bool, FaceIdError> {
        Ok(self.get(id)?.is_some())
    }
}

/// An in-memory description store backed by a HashMap.
#[derive(Default)]
pub struct MemoryDescriptions {
    data: Mutex<HashMap<u64, String>>,
}

impl MemoryDescriptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DescriptionStore for MemoryDescriptions {
    fn get(&self, id: u64) -> Result<Option<String>, FaceIdError> {
        Ok(self.data.lock().get(&id).cloned())
    }

    fn add(&self, id: u64, description: &str) -> Result<(), FaceIdError> {
        self.data.lock().insert(id, description.to_string());
        Ok(())
    }

    fn update(&self, id: u64, description: &str) -> Result<bool, FaceIdError> {
        match self.data.lock().get_mut(&id) {
            Some(d) => {
                *d = description.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn storage_err(e: impl std::fmt::Display) -> FaceIdError {
    FaceIdError::Descriptions(e.to_string())
}

/// A persistent description store backed by redb.
pub struct RedbDescriptions {
    db: Database,
}

impl RedbDescriptions {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FaceIdError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let db = Database::create(path).map_err(storage_err)?;

        // Create the table if it doesn't exist
        let tx = db.begin_write().map_err(storage_err)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;

        info!(path = %path.display(), "description store opened");
        Ok(Self { db })
    }

    fn write(&self, id: u64, description: &str, only_existing: bool) -> Result<bool, FaceIdError> {
        let tx = self.db.begin_write().map_err(storage_err)?;
        let written = {
            let mut table = tx.open_table(TABLE).map_err(storage_err)?;
            let exists = table.get(id).map_err(storage_err)?.is_some();
            if only_existing && !exists {
                false
            } else {
                table.insert(id, description).map_err(storage_err)?;
                true
            }
        };
        tx.commit().map_err(storage_err)?;
        Ok(written)
    }
}

impl DescriptionStore for RedbDescriptions {
    fn get(&self, id: u64) -> Result<Option<String>, FaceIdError> {
        let tx = self.db.begin_read().map_err(storage_err)?;
        let table = tx.open_table(TABLE).map_err(storage_err)?;
        Ok(table
            .get(id)
            .map_err(storage_err)?
            .map(|v| v.value().to_string()))
    }

    fn add(&self, id: u64, description: &str) -> Result<(), FaceIdError> {
        self.write(id, description, false).map(|_| ())
    }

    fn update(&self, id: u64, description: &str) -> Result<bool, FaceIdError> {
        self.write(id, description, true)
    }
}
