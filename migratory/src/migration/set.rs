use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::migration::action::WrapFn;
use crate::migration::migration::{Migration, MigrationRecord};
use itertools::Itertools;

/// Source of migration records.
///
/// Loading migration definitions from arbitrary sources (directories of
/// script files, embedded lists, remote catalogs) is the loader's concern;
/// the engine only requires the resulting records. Implementations that scan
/// the filesystem can consume the `migrations_path` and `migrations_pattern`
/// engine options.
pub trait MigrationLoader {
    fn load(&self) -> MigratoryResult<Vec<MigrationRecord>>;
}

/// Trivial loader over a prebuilt record list.
#[derive(Clone, Debug, Default)]
pub struct VecLoader {
    records: Vec<MigrationRecord>,
}

impl VecLoader {
    pub fn new(records: Vec<MigrationRecord>) -> Self {
        VecLoader { records }
    }
}

impl MigrationLoader for VecLoader {
    fn load(&self) -> MigratoryResult<Vec<MigrationRecord>> {
        Ok(self.records.clone())
    }
}

/// The ordered collection of available migrations.
///
/// # Purpose
/// Holds every migration known to one engine instance, normalized and sorted
/// ascending by key. The key ordering is plain lexicographic; callers embed a
/// monotonically increasing prefix (typically a timestamp) in names when
/// chronological ordering matters.
///
/// # Characteristics
/// - Immutable after construction
/// - Rejects duplicate names at construction time
/// - Resolves requested needles by exact-or-prefix match
#[derive(Clone, Debug, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Normalizes records into a sorted set.
    ///
    /// Each record's configured up/down method names are resolved into action
    /// slots and every present action is passed through the wrap adapter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if two records share a name.
    pub fn resolve(
        records: &[MigrationRecord],
        up_name: &str,
        down_name: &str,
        wrap: &WrapFn,
    ) -> MigratoryResult<MigrationSet> {
        if let Some(duplicate) = records.iter().map(|r| r.name()).duplicates().next() {
            return Err(MigratoryError::new(
                &format!("Duplicate migration name: {}", duplicate),
                ErrorKind::ValidationError,
            ));
        }

        let mut migrations = records
            .iter()
            .map(|record| Migration::resolve(record, up_name, down_name, wrap))
            .collect::<Vec<_>>();
        migrations.sort_by(|a, b| a.key().cmp(b.key()));

        Ok(MigrationSet { migrations })
    }

    /// Resolves a requested name to its migration.
    ///
    /// Matches on exact key equality or key prefix, in set order.
    pub fn find(&self, needle: &str) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.matches(needle))
    }

    /// Iterates over all migrations in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Returns the number of migrations in the set.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns true if the set holds no migrations.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
