use crate::errors::MigratoryResult;
use crate::storage::{Storage, StorageModule, StorageProvider};
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory implementation of the applied-set storage.
///
/// # Purpose
/// `InMemoryStorage` keeps the applied set in process memory. Suitable for
/// tests, dry runs, and scenarios where persistence across processes is not
/// required. All data is lost when the last handle is dropped.
///
/// # Characteristics
/// - **Thread-Safe**: interior state behind a read-write lock
/// - **Ordered**: an index set preserves application order while enforcing
///   at-most-once membership
/// - **No Persistence**: nothing is written to durable media
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<InMemoryStorageInner>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory storage.
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

impl StorageProvider for InMemoryStorage {
    fn log_migration(&self, name: &str) -> MigratoryResult<()> {
        self.inner.entries.write().insert(name.to_string());
        Ok(())
    }

    fn unlog_migration(&self, name: &str) -> MigratoryResult<()> {
        self.inner.entries.write().shift_remove(name);
        Ok(())
    }

    fn executed(&self) -> MigratoryResult<Vec<String>> {
        Ok(self.inner.entries.read().iter().cloned().collect())
    }
}

#[derive(Default)]
struct InMemoryStorageInner {
    entries: RwLock<IndexSet<String>>,
}

/// Backend selector producing [`InMemoryStorage`] handles.
#[derive(Default)]
pub struct InMemoryStorageModule;

impl InMemoryStorageModule {
    pub fn new() -> InMemoryStorageModule {
        InMemoryStorageModule
    }
}

impl StorageModule for InMemoryStorageModule {
    fn get_storage(&self) -> MigratoryResult<Storage> {
        Ok(Storage::new(InMemoryStorage::new()))
    }
}
