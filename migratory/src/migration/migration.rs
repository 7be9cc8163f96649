use crate::migration::action::{ActionFn, RawAction, WrapFn};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A raw migration definition as produced by a loader.
///
/// # Purpose
/// Carries the migration name and a map of named raw actions. Which entries of
/// the map become the up and down actions is decided at set construction time
/// using the configured method names, so loaders producing records with
/// unconventional method names need no special handling.
///
/// # Usage
/// ```ignore
/// let record = MigrationRecord::new("20240101120000-create-users.js")
///     .up(RawAction::ready(|_params| Ok(())))
///     .down(RawAction::ready(|_params| Ok(())));
/// ```
#[derive(Clone, Debug)]
pub struct MigrationRecord {
    name: String,
    actions: HashMap<String, RawAction>,
}

impl MigrationRecord {
    /// Creates an empty record with the given name.
    ///
    /// The name is the migration's identity: its sort key and its storage
    /// entry. By the default convention it is a file name including the
    /// extension.
    pub fn new(name: &str) -> Self {
        MigrationRecord {
            name: name.to_string(),
            actions: HashMap::new(),
        }
    }

    /// Registers the action under the default up method name (`up`).
    pub fn up(self, action: RawAction) -> Self {
        self.action(crate::common::DEFAULT_UP_NAME, action)
    }

    /// Registers the action under the default down method name (`down`).
    pub fn down(self, action: RawAction) -> Self {
        self.action(crate::common::DEFAULT_DOWN_NAME, action)
    }

    /// Registers the action under an arbitrary method name.
    ///
    /// Use this for records whose engine is configured with custom
    /// `up_name`/`down_name` values.
    pub fn action(mut self, method: &str, action: RawAction) -> Self {
        self.actions.insert(method.to_string(), action);
        self
    }

    /// Returns the record's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a raw action by method name.
    pub(crate) fn find_action(&self, method: &str) -> Option<RawAction> {
        self.actions.get(method).cloned()
    }
}

/// A named, reversible unit of work.
///
/// # Purpose
/// The normalized form of a [`MigrationRecord`]: the configured up and down
/// method names have been resolved into two optional action slots and every
/// present action has been passed through the wrap adapter. Immutable after
/// construction.
///
/// # Characteristics
/// - **Cloneable**: clones share the same underlying state via `Arc`
/// - **Explicit absence**: a record without the configured method yields an
///   empty slot; the failure surfaces when the slot is invoked, not at load
///   time
/// - **Two names**: `key()` is the full stored name used for sorting and
///   storage entries; `name()` is the display form (extension stripped) used
///   in events and log lines
#[derive(Clone)]
pub struct Migration {
    inner: Arc<MigrationInner>,
}

impl Migration {
    /// Normalizes a record into a migration.
    ///
    /// # Arguments
    /// * `record` - The raw loader output
    /// * `up_name` / `down_name` - The configured method names to resolve
    /// * `wrap` - The adapter applied to every found raw action
    pub(crate) fn resolve(
        record: &MigrationRecord,
        up_name: &str,
        down_name: &str,
        wrap: &WrapFn,
    ) -> Self {
        let up = record.find_action(up_name).map(|raw| wrap(raw));
        let down = record.find_action(down_name).map(|raw| wrap(raw));

        Migration {
            inner: Arc::new(MigrationInner {
                name: display_name(record.name()),
                key: record.name().to_string(),
                up,
                down,
            }),
        }
    }

    /// Returns the full stored name: the sort key and the storage entry.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns the display name, used in events and log lines.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the resolved up action, if the record carried one.
    pub fn up_action(&self) -> Option<ActionFn> {
        self.inner.up.clone()
    }

    /// Returns the resolved down action, if the record carried one.
    pub fn down_action(&self) -> Option<ActionFn> {
        self.inner.down.clone()
    }

    /// Tests whether a requested needle designates this migration.
    ///
    /// A needle matches on exact equality or as a prefix of the stored name,
    /// so an extension-less request resolves its file-named migration.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.inner.key.starts_with(needle)
    }
}

impl Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("key", &self.inner.key)
            .field("up", &self.inner.up.is_some())
            .field("down", &self.inner.down.is_some())
            .finish()
    }
}

struct MigrationInner {
    key: String,
    name: String,
    up: Option<ActionFn>,
    down: Option<ActionFn>,
}

// trailing extension is display noise, the key keeps it
fn display_name(key: &str) -> String {
    match key.rfind('.') {
        Some(idx) if idx > 0 => key[..idx].to_string(),
        _ => key.to_string(),
    }
}
