use crate::common::DEFAULT_STORAGE_PATH;
use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::storage::{Storage, StorageModule, StorageProvider};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed implementation of the applied-set storage.
///
/// # Purpose
/// `JsonStorage` persists the applied set as a JSON array of keys at a
/// configured path. It is the reference backend and the engine default.
///
/// # Characteristics
/// - **Read-before-query**: the file is re-read on every `executed` call and
///   before every mutation, so edits from outside the process are observed
/// - **Atomic rewrite**: mutations serialize the whole list to a sibling
///   temp file and rename it over the record, so a failed write leaves the
///   last durable state intact
/// - **Fail-fast init**: constructing the storage over an existing but
///   unreadable or corrupt record fails immediately
///
/// A missing file reads as an empty applied set; the file is created by the
/// first mutation.
#[derive(Clone, Debug)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Opens the applied-set record at the given path.
    ///
    /// # Errors
    ///
    /// Fails if a file exists at the path but cannot be read or parsed.
    pub fn new(path: impl AsRef<Path>) -> MigratoryResult<Self> {
        let storage = JsonStorage {
            path: path.as_ref().to_path_buf(),
        };
        // surface an unusable record at construction, not mid-plan
        storage.read_entries()?;
        Ok(storage)
    }

    /// Returns the path of the applied-set record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> MigratoryResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            MigratoryError::new_with_cause(
                &format!("Unable to read applied set record: {}", self.path.display()),
                ErrorKind::StorageError,
                e.into(),
            )
        })?;

        serde_json::from_str::<Vec<String>>(&content).map_err(|e| {
            MigratoryError::new_with_cause(
                &format!("Applied set record is corrupt: {}", self.path.display()),
                ErrorKind::StorageError,
                e.into(),
            )
        })
    }

    fn write_entries(&self, entries: &[String]) -> MigratoryResult<()> {
        let content = serde_json::to_string_pretty(entries)?;

        let mut tmp_path = self.path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, content).map_err(|e| {
            MigratoryError::new_with_cause(
                &format!("Unable to write applied set record: {}", self.path.display()),
                ErrorKind::StorageError,
                e.into(),
            )
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            MigratoryError::new_with_cause(
                &format!("Unable to replace applied set record: {}", self.path.display()),
                ErrorKind::StorageError,
                e.into(),
            )
        })?;

        log::debug!("Rewrote applied set record: {}", self.path.display());
        Ok(())
    }
}

impl StorageProvider for JsonStorage {
    fn log_migration(&self, name: &str) -> MigratoryResult<()> {
        let mut entries = self.read_entries()?;
        if entries.iter().any(|e| e == name) {
            return Ok(());
        }
        entries.push(name.to_string());
        self.write_entries(&entries)
    }

    fn unlog_migration(&self, name: &str) -> MigratoryResult<()> {
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|e| e != name);
        if entries.len() == before {
            return Ok(());
        }
        self.write_entries(&entries)
    }

    fn executed(&self) -> MigratoryResult<Vec<String>> {
        self.read_entries()
    }
}

/// Backend selector producing [`JsonStorage`] handles.
///
/// The default engine backend, rooted at [`DEFAULT_STORAGE_PATH`] unless a
/// path is given.
#[derive(Clone, Debug)]
pub struct JsonStorageModule {
    path: PathBuf,
}

impl JsonStorageModule {
    /// Creates a module producing storage at the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonStorageModule {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Default for JsonStorageModule {
    fn default() -> Self {
        JsonStorageModule::new(DEFAULT_STORAGE_PATH)
    }
}

impl StorageModule for JsonStorageModule {
    fn get_storage(&self) -> MigratoryResult<Storage> {
        Ok(Storage::new(JsonStorage::new(&self.path)?))
    }
}
