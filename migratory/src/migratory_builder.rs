use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::migration::{MigrationLoader, MigrationRecord, MigrationSet, ParamsProvider, VecLoader, WrapFn};
use crate::migratory::Migratory;
use crate::migratory_config::{LogSink, MigratoryConfig};
use crate::storage::StorageModule;
use regex::Regex;
use std::path::Path;

/// Builder for creating and configuring a migration engine instance.
///
/// `MigratoryBuilder` provides a fluent API for configuring engine options
/// before building. It follows the builder pattern and captures errors during
/// configuration to ensure they are propagated when building the engine.
///
/// # Examples
///
/// ```rust,ignore
/// use migratory::Migratory;
/// use migratory::migration::{MigrationRecord, RawAction};
/// use migratory::storage::JsonStorageModule;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let migratory = Migratory::builder()
///     .migrations(vec![
///         MigrationRecord::new("20240101120000-create-users.js")
///             .up(RawAction::ready(|_params| Ok(())))
///             .down(RawAction::ready(|_params| Ok(()))),
///     ])
///     .storage_module(JsonStorageModule::new("state/migratory.json"))
///     .build()?;
///
/// migratory.up(Default::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MigratoryBuilder {
    error: Option<MigratoryError>,
    config: MigratoryConfig,
    loader: Option<Box<dyn MigrationLoader>>,
    storage_module: Option<Box<dyn StorageModule>>,
}

impl MigratoryBuilder {
    /// Creates a new `MigratoryBuilder` with default configuration.
    ///
    /// The default configuration uses the JSON storage backend at
    /// `migratory.json`, `up`/`down` as method names, the default wrap
    /// adapter, no action parameters, and a no-op log sink.
    pub fn new() -> Self {
        MigratoryBuilder::default()
    }

    /// Provides the migration records directly.
    ///
    /// Shorthand for a [`VecLoader`] over the given records.
    pub fn migrations(self, records: Vec<MigrationRecord>) -> Self {
        self.loader(VecLoader::new(records))
    }

    /// Provides the migration loader.
    ///
    /// The loader is invoked once, at build time.
    pub fn loader(mut self, loader: impl MigrationLoader + 'static) -> Self {
        if self.error.is_none() {
            if self.loader.is_some() {
                self.error = Some(MigratoryError::new(
                    "The migration loader is already configured",
                    ErrorKind::ValidationError,
                ));
            } else {
                self.loader = Some(Box::new(loader));
            }
        }
        self
    }

    /// Sets the migration source path, made available to filesystem loaders.
    pub fn migrations_path(mut self, path: impl AsRef<Path>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_migrations_path(path.as_ref()) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the migration file pattern, made available to filesystem loaders.
    pub fn migrations_pattern(mut self, pattern: Regex) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_migrations_pattern(pattern) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the action wrap adapter.
    pub fn wrap(mut self, wrap: WrapFn) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_wrap(wrap) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the action parameter provider.
    pub fn params(mut self, params: ParamsProvider) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_params(params) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the up method name resolved on migration records (default `up`).
    pub fn up_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_up_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the down method name resolved on migration records (default `down`).
    pub fn down_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_down_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the contract log line sink (default: no-op).
    pub fn logger(mut self, logger: LogSink) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_logger(logger) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the storage backend module.
    pub fn storage_module(mut self, module: impl StorageModule + 'static) -> Self {
        if self.error.is_none() {
            if self.storage_module.is_some() {
                self.error = Some(MigratoryError::new(
                    "The storage module is already configured",
                    ErrorKind::ValidationError,
                ));
            } else {
                self.storage_module = Some(Box::new(module));
            }
        }
        self
    }

    /// Builds the engine with the configured settings.
    ///
    /// This finalizes the configuration, loads the migration records,
    /// normalizes them into the migration set, and initializes the storage
    /// backend. Any errors captured during configuration are returned here.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration was invalid, the loader fails,
    /// records carry duplicate names, or the storage backend cannot be
    /// initialized.
    pub fn build(self) -> MigratoryResult<Migratory> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let records = match &self.loader {
            Some(loader) => loader.load()?,
            None => Vec::new(),
        };

        let migrations = MigrationSet::resolve(
            &records,
            &self.config.up_name(),
            &self.config.down_name(),
            &self.config.wrap(),
        )?;

        let storage = match &self.storage_module {
            Some(module) => module.get_storage()?,
            None => Self::default_storage()?,
        };

        self.config.initialize();
        log::debug!(
            "Initialized migration engine with {} migration(s)",
            migrations.len()
        );
        Ok(Migratory::new(self.config, storage, migrations))
    }

    #[cfg(feature = "json-storage")]
    fn default_storage() -> MigratoryResult<crate::storage::Storage> {
        use crate::storage::JsonStorageModule;
        JsonStorageModule::default().get_storage()
    }

    #[cfg(not(feature = "json-storage"))]
    fn default_storage() -> MigratoryResult<crate::storage::Storage> {
        Err(MigratoryError::new(
            "No storage module configured",
            ErrorKind::ValidationError,
        ))
    }
}
