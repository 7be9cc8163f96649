use crate::errors::MigratoryResult;
use std::fmt::Debug;
use std::sync::Arc;

/// Low-level interface for persisting the applied set.
///
/// # Purpose
/// Defines the contract that all storage implementations must follow. The
/// applied set is the ordered list of migration keys currently considered
/// executed; its membership is the sole source of truth for "has this
/// migration run".
///
/// # Key Responsibilities
/// - **Recording**: add a key after a successful up action
/// - **Unrecording**: remove a key after a successful down action
/// - **Listing**: report all applied keys in application order
///
/// # Contract
/// - `log_migration` of an already-logged key is idempotent: the key appears
///   at most once afterwards
/// - `unlog_migration` of an absent key is a no-op
/// - `executed` reflects the last durable write; implementations backed by a
///   shared medium re-read before answering so back-to-back operations
///   observe a consistent view
///
/// # Implementations
/// - `JsonStorage`: persistent applied set in a JSON text record
/// - `InMemoryStorage`: ephemeral applied set for tests and dry runs
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. The engine itself never issues
/// concurrent calls; the bound allows the engine to be shared across threads.
pub trait StorageProvider: Send + Sync {
    /// Records a migration key as applied.
    fn log_migration(&self, name: &str) -> MigratoryResult<()>;

    /// Removes a migration key from the applied set.
    fn unlog_migration(&self, name: &str) -> MigratoryResult<()>;

    /// Returns all applied keys in application order.
    fn executed(&self) -> MigratoryResult<Vec<String>>;
}

/// Handle to a storage backend.
///
/// Wraps a [`StorageProvider`] behind a cheap-to-clone facade; all clones
/// share the same underlying backend.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn StorageProvider>,
}

impl Storage {
    /// Creates a storage handle over the given provider.
    pub fn new(provider: impl StorageProvider + 'static) -> Self {
        Storage {
            inner: Arc::new(provider),
        }
    }

    /// Records a migration key as applied. Idempotent.
    pub fn log_migration(&self, name: &str) -> MigratoryResult<()> {
        self.inner.log_migration(name)
    }

    /// Removes a migration key from the applied set. No-op when absent.
    pub fn unlog_migration(&self, name: &str) -> MigratoryResult<()> {
        self.inner.unlog_migration(name)
    }

    /// Returns all applied keys in application order.
    pub fn executed(&self) -> MigratoryResult<Vec<String>> {
        self.inner.executed()
    }
}

impl Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish()
    }
}

/// Backend selector for engine construction.
///
/// A module owns the backend configuration and produces the [`Storage`]
/// handle when the engine is built.
pub trait StorageModule {
    fn get_storage(&self) -> MigratoryResult<Storage>;
}
