//! Configuration management for the migration engine.

use crate::common::{DEFAULT_DOWN_NAME, DEFAULT_UP_NAME};
use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::migration::{default_wrap, ParamsProvider, WrapFn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Sink for the engine's contract log lines.
///
/// Invoked with exactly one line per call. The default sink discards lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Public interface for engine configuration.
///
/// Every option is set at most once, before the engine is built; mutation
/// after initialization is rejected. Accessors fall back to the documented
/// defaults for unset options.
///
/// # Examples
///
/// ```rust,ignore
/// use migratory::Migratory;
///
/// let migratory = Migratory::builder()
///     .up_name("apply")
///     .down_name("rollback")
///     .build()?;
/// ```
#[derive(Clone, Default)]
pub struct MigratoryConfig {
    /// The pointer to implementation. Uses Arc for cheap cloning and thread safety.
    inner: Arc<MigratoryConfigInner>,
}

impl MigratoryConfig {
    /// Creates a new configuration instance with default values.
    pub fn new() -> Self {
        MigratoryConfig::default()
    }

    /// Returns the configured up method name (default `up`).
    pub fn up_name(&self) -> String {
        self.inner
            .up_name
            .get()
            .cloned()
            .unwrap_or_else(|| DEFAULT_UP_NAME.to_string())
    }

    /// Sets the up method name.
    ///
    /// # Errors
    ///
    /// Returns error if already configured, already initialized, or empty.
    pub fn set_up_name(&self, name: &str) -> MigratoryResult<()> {
        self.inner.set_string_once(&self.inner.up_name, "up method name", name)
    }

    /// Returns the configured down method name (default `down`).
    pub fn down_name(&self) -> String {
        self.inner
            .down_name
            .get()
            .cloned()
            .unwrap_or_else(|| DEFAULT_DOWN_NAME.to_string())
    }

    /// Sets the down method name.
    ///
    /// # Errors
    ///
    /// Returns error if already configured, already initialized, or empty.
    pub fn set_down_name(&self, name: &str) -> MigratoryResult<()> {
        self.inner
            .set_string_once(&self.inner.down_name, "down method name", name)
    }

    /// Returns the action wrap adapter (default [`default_wrap`]).
    pub fn wrap(&self) -> WrapFn {
        self.inner.wrap.get().cloned().unwrap_or_else(default_wrap)
    }

    /// Sets the action wrap adapter.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or already initialized.
    pub fn set_wrap(&self, wrap: WrapFn) -> MigratoryResult<()> {
        self.inner.guard_mutation("wrap adapter")?;
        self.inner
            .wrap
            .set(wrap)
            .map_err(|_| MigratoryConfigInner::already_configured("wrap adapter"))
    }

    /// Returns the action parameter provider (default: no parameters).
    pub fn params(&self) -> ParamsProvider {
        self.inner.params.get().cloned().unwrap_or_default()
    }

    /// Sets the action parameter provider.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or already initialized.
    pub fn set_params(&self, params: ParamsProvider) -> MigratoryResult<()> {
        self.inner.guard_mutation("params provider")?;
        self.inner
            .params
            .set(params)
            .map_err(|_| MigratoryConfigInner::already_configured("params provider"))
    }

    /// Returns the contract log line sink (default: no-op).
    pub fn logger(&self) -> LogSink {
        self.inner
            .logger
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::new(|_line| {}))
    }

    /// Sets the contract log line sink.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or already initialized.
    pub fn set_logger(&self, logger: LogSink) -> MigratoryResult<()> {
        self.inner.guard_mutation("logger")?;
        self.inner
            .logger
            .set(logger)
            .map_err(|_| MigratoryConfigInner::already_configured("logger"))
    }

    /// Returns the migration source path, if configured.
    ///
    /// The engine holds this option for filesystem loaders; it does not read
    /// the path itself.
    pub fn migrations_path(&self) -> Option<PathBuf> {
        self.inner.migrations_path.get().cloned()
    }

    /// Sets the migration source path.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or already initialized.
    pub fn set_migrations_path(&self, path: &Path) -> MigratoryResult<()> {
        self.inner.guard_mutation("migrations path")?;
        self.inner
            .migrations_path
            .set(path.to_path_buf())
            .map_err(|_| MigratoryConfigInner::already_configured("migrations path"))
    }

    /// Returns the migration file pattern, if configured.
    ///
    /// Like the path, this option belongs to filesystem loaders.
    pub fn migrations_pattern(&self) -> Option<Regex> {
        self.inner.migrations_pattern.get().cloned()
    }

    /// Sets the migration file pattern.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or already initialized.
    pub fn set_migrations_pattern(&self, pattern: Regex) -> MigratoryResult<()> {
        self.inner.guard_mutation("migrations pattern")?;
        self.inner
            .migrations_pattern
            .set(pattern)
            .map_err(|_| MigratoryConfigInner::already_configured("migrations pattern"))
    }

    /// Marks the configuration as initialized; later mutation is rejected.
    pub(crate) fn initialize(&self) {
        self.inner.initialized.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for MigratoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigratoryConfig")
            .field("up_name", &self.up_name())
            .field("down_name", &self.down_name())
            .field("migrations_path", &self.migrations_path())
            .finish()
    }
}

#[derive(Default)]
struct MigratoryConfigInner {
    up_name: OnceLock<String>,
    down_name: OnceLock<String>,
    wrap: OnceLock<WrapFn>,
    params: OnceLock<ParamsProvider>,
    logger: OnceLock<LogSink>,
    migrations_path: OnceLock<PathBuf>,
    migrations_pattern: OnceLock<Regex>,
    initialized: AtomicBool,
}

impl MigratoryConfigInner {
    fn guard_mutation(&self, what: &str) -> MigratoryResult<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Err(MigratoryError::new(
                &format!("Cannot change {} after initialization", what),
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }

    fn set_string_once(
        &self,
        slot: &OnceLock<String>,
        what: &str,
        value: &str,
    ) -> MigratoryResult<()> {
        self.guard_mutation(what)?;
        if value.is_empty() {
            return Err(MigratoryError::new(
                &format!("The {} cannot be empty", what),
                ErrorKind::ValidationError,
            ));
        }
        slot.set(value.to_string())
            .map_err(|_| Self::already_configured(what))
    }

    fn already_configured(what: &str) -> MigratoryError {
        MigratoryError::new(
            &format!("The {} is already configured", what),
            ErrorKind::ValidationError,
        )
    }
}
