use crate::common::{MigrationEventBus, MigrationEventListener, SubscriberRef};
use crate::errors::MigratoryResult;
use crate::migration::{
    ExecuteOptions, MigrationExecutor, MigrationSet, Method, OpOptions, PlanResolver,
};
use crate::migratory_builder::MigratoryBuilder;
use crate::migratory_config::MigratoryConfig;
use crate::storage::Storage;
use std::sync::Arc;

/// The migration engine instance.
///
/// `Migratory` is the entry point for all migration operations. It provides
/// methods for:
/// - Running pending migrations (`up`) and reverting applied ones (`down`)
/// - Executing explicitly named migrations in either direction
/// - Inspecting pending and executed migrations
/// - Subscribing to lifecycle events
///
/// `Migratory` uses the PIMPL (Pointer to Implementation) design pattern
/// internally. Clones share the same configuration, storage backend,
/// migration set, and event bus through `Arc<MigratoryInner>`.
///
/// Plans execute strictly serially within one call, and the engine performs
/// no internal locking around execution: callers must not issue two
/// executions against the same storage backend concurrently.
///
/// # Examples
///
/// ```rust,ignore
/// use migratory::Migratory;
/// use migratory::migration::{MigrationRecord, OpOptions, RawAction};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let migratory = Migratory::builder()
///     .migrations(vec![
///         MigrationRecord::new("20240101120000-create-users.js")
///             .up(RawAction::ready(|_params| Ok(())))
///             .down(RawAction::ready(|_params| Ok(()))),
///     ])
///     .build()?;
///
/// // run everything pending
/// let applied = migratory.up(OpOptions::default())?;
/// assert_eq!(applied, vec!["20240101120000-create-users"]);
///
/// // revert the most recent migration
/// migratory.down(OpOptions::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Migratory {
    inner: Arc<MigratoryInner>,
}

impl Migratory {
    /// Creates a new `MigratoryBuilder` for configuring and building an engine.
    pub fn builder() -> MigratoryBuilder {
        MigratoryBuilder::new()
    }

    pub(crate) fn new(config: MigratoryConfig, storage: Storage, migrations: MigrationSet) -> Self {
        Migratory {
            inner: Arc::new(MigratoryInner {
                config,
                storage,
                migrations,
                event_bus: MigrationEventBus::new(),
            }),
        }
    }

    /// Executes explicitly named migrations in the requested direction.
    ///
    /// The named migrations run verbatim in the order given, without checking
    /// whether they are pending or applied. With no names, nothing runs and
    /// an empty list is returned.
    ///
    /// # Returns
    ///
    /// The display names of the migrations that completed, in execution
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if a name does not resolve, a migration lacks the
    /// configured method, an action fails, or storage fails. Migrations
    /// completed before the failure stay recorded.
    pub fn execute(&self, options: ExecuteOptions) -> MigratoryResult<Vec<String>> {
        self.inner.execute(options)
    }

    /// Runs pending migrations.
    ///
    /// With default options, every pending migration runs in ascending key
    /// order. `to` bounds the run, `limit` truncates it, and `only` restricts
    /// it to named pending migrations.
    ///
    /// # Returns
    ///
    /// The display names of the migrations that were applied.
    pub fn up(&self, options: OpOptions) -> MigratoryResult<Vec<String>> {
        self.inner.run(Method::Up, options)
    }

    /// Reverts applied migrations.
    ///
    /// With default options, only the most recently applied migration is
    /// reverted. `all` reverts the full history, `limit` reverts the last n,
    /// `to` reverts down to (and including) the named migration, and `only`
    /// restricts the run to named applied migrations.
    ///
    /// # Returns
    ///
    /// The display names of the migrations that were reverted.
    pub fn down(&self, options: OpOptions) -> MigratoryResult<Vec<String>> {
        self.inner.run(Method::Down, options)
    }

    /// Returns the display names of all pending migrations, ascending.
    pub fn pending(&self) -> MigratoryResult<Vec<String>> {
        self.inner.pending()
    }

    /// Returns the display names of all applied migrations, in application
    /// order.
    pub fn executed(&self) -> MigratoryResult<Vec<String>> {
        self.inner.executed()
    }

    /// Subscribes a listener to migration lifecycle events.
    ///
    /// Delivery is synchronous, in subscription order, for the life of this
    /// engine instance.
    pub fn subscribe(
        &self,
        listener: MigrationEventListener,
    ) -> MigratoryResult<Option<SubscriberRef>> {
        self.inner.event_bus.register(listener)
    }

    /// Removes a previously subscribed listener.
    pub fn unsubscribe(&self, subscriber: SubscriberRef) -> MigratoryResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    /// Returns a handle to the storage backend.
    pub fn storage(&self) -> Storage {
        self.inner.storage.clone()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> MigratoryConfig {
        self.inner.config.clone()
    }
}

impl std::fmt::Debug for Migratory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migratory")
            .field("migrations", &self.inner.migrations.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

struct MigratoryInner {
    config: MigratoryConfig,
    storage: Storage,
    migrations: MigrationSet,
    event_bus: MigrationEventBus,
}

impl MigratoryInner {
    fn execute(&self, options: ExecuteOptions) -> MigratoryResult<Vec<String>> {
        let applied = self.storage.executed()?;
        let resolver = PlanResolver::new(&self.migrations, &applied);
        let plan = resolver.resolve_explicit(options.method(), options.names(), false)?;
        self.executor().run(&plan)
    }

    fn run(&self, method: Method, options: OpOptions) -> MigratoryResult<Vec<String>> {
        let applied = self.storage.executed()?;
        let resolver = PlanResolver::new(&self.migrations, &applied);
        let plan = resolver.resolve(method, &options)?;
        self.executor().run(&plan)
    }

    fn pending(&self) -> MigratoryResult<Vec<String>> {
        let applied = self.storage.executed()?;
        let resolver = PlanResolver::new(&self.migrations, &applied);
        Ok(resolver
            .pending()
            .iter()
            .map(|m| m.name().to_string())
            .collect())
    }

    fn executed(&self) -> MigratoryResult<Vec<String>> {
        let applied = self.storage.executed()?;
        let resolver = PlanResolver::new(&self.migrations, &applied);
        Ok(resolver
            .executed()
            .iter()
            .map(|m| m.name().to_string())
            .collect())
    }

    fn executor(&self) -> MigrationExecutor {
        MigrationExecutor::new(
            self.config.clone(),
            self.storage.clone(),
            self.event_bus.clone(),
        )
    }
}
