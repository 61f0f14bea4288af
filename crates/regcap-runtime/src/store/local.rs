//! Local file-based store backend.
//!
//! Values are stored one file per key:
//!
//! ```text
//! ~/.regcap/store/
//! └── 00000000-0000-0000-0000-000000000000/     scope
//!     └── GridRegistrationUrls/                 kind
//!         ├── 1000.json                         key
//!         └── 4294967297000.json
//! ```

use super::{GenericStore, StorageError};
use regcap_types::Scope;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local file-based [`GenericStore`].
///
/// # Features
///
/// - Atomic writes (write to temp, then rename)
/// - Automatic directory creation
/// - `~` expansion of the base path
///
/// # Example
///
/// ```no_run
/// use regcap_runtime::{GenericStore, LocalFileStore, Scope};
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalFileStore::new(PathBuf::from("~/.regcap/store"))?;
/// store.add(Scope::GLOBAL, "GridRegistrationUrls", "1000", "{}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_path: PathBuf,
}

impl LocalFileStore {
    /// Creates a new local file store.
    ///
    /// The directory will be created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DirectoryCreation` if the directory cannot be created.
    pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        let expanded = expand_tilde(&base_path);

        if !expanded.exists() {
            std::fs::create_dir_all(&expanded)
                .map_err(|e| StorageError::directory_creation(&expanded, e))?;
        }

        Ok(Self {
            base_path: expanded,
        })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn kind_dir(&self, scope: Scope, kind: &str) -> Result<PathBuf, StorageError> {
        validate_name(kind)?;
        Ok(self.base_path.join(scope.to_string()).join(kind))
    }

    fn value_path(&self, scope: Scope, kind: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_name(key)?;
        Ok(self.kind_dir(scope, kind)?.join(format!("{key}.json")))
    }
}

impl GenericStore for LocalFileStore {
    async fn add(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let dir = self.kind_dir(scope, kind)?;
        let path = self.value_path(scope, kind, key)?;
        let temp_path = dir.join(format!(".{key}.json.tmp"));

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::directory_creation(&dir, e))?;

        // Write to temp file first, then rename over the target.
        fs::write(&temp_path, value).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    async fn get(&self, scope: Scope, kind: &str, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(scope, kind, key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_all(&self, scope: Scope, kind: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.kind_dir(scope, kind)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension() != Some(std::ffi::OsStr::new("json")) {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
            {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut values = Vec::with_capacity(paths.len());
        for path in paths {
            values.push(fs::read_to_string(&path).await?);
        }
        Ok(values)
    }

    async fn remove(&self, scope: Scope, kind: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.value_path(scope, kind, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rejects names that would escape their directory or collide with temp files.
fn validate_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_key(name))
    }
}

/// Expands `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KIND: &str = "GridRegistrationUrls";

    fn test_store() -> (LocalFileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp.path().join("store")).unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn add_and_get() {
        let (store, _temp) = test_store();

        store.add(Scope::GLOBAL, KIND, "1000", "{\"a\":1}").await.unwrap();

        let loaded = store.get(Scope::GLOBAL, KIND, "1000").await.unwrap();
        assert_eq!(loaded.as_deref(), Some("{\"a\":1}"));
        assert!(store
            .base_path()
            .join("00000000-0000-0000-0000-000000000000")
            .join(KIND)
            .join("1000.json")
            .exists());
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (store, _temp) = test_store();
        assert!(store.get(Scope::GLOBAL, KIND, "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_file() {
        let (store, _temp) = test_store();
        store.add(Scope::GLOBAL, KIND, "7", "first").await.unwrap();
        store.add(Scope::GLOBAL, KIND, "7", "second").await.unwrap();

        assert_eq!(
            store.get(Scope::GLOBAL, KIND, "7").await.unwrap().as_deref(),
            Some("second")
        );
        let dir = store.kind_dir(Scope::GLOBAL, KIND).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn get_all_skips_foreign_files() {
        let (store, _temp) = test_store();
        store.add(Scope::GLOBAL, KIND, "2", "two").await.unwrap();
        store.add(Scope::GLOBAL, KIND, "1", "one").await.unwrap();

        let dir = store.kind_dir(Scope::GLOBAL, KIND).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.join(".3.json.tmp"), "partial").unwrap();

        let all = store.get_all(Scope::GLOBAL, KIND).await.unwrap();
        assert_eq!(all, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn get_all_missing_kind_is_empty() {
        let (store, _temp) = test_store();
        assert!(store.get_all(Scope::GLOBAL, KIND).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, _temp) = test_store();
        store.add(Scope::GLOBAL, KIND, "1", "one").await.unwrap();

        assert!(store.remove(Scope::GLOBAL, KIND, "1").await.unwrap());
        assert!(!store.remove(Scope::GLOBAL, KIND, "1").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_escaping_keys() {
        let (store, _temp) = test_store();
        for key in ["", "../x", "a/b", ".hidden"] {
            let err = store.add(Scope::GLOBAL, KIND, key, "v").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn reopen_sees_existing_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store");
        LocalFileStore::new(path.clone())
            .unwrap()
            .add(Scope::GLOBAL, KIND, "1", "kept")
            .await
            .unwrap();

        let reopened = LocalFileStore::new(path).unwrap();
        assert_eq!(
            reopened.get(Scope::GLOBAL, KIND, "1").await.unwrap().as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn expand_tilde_with_home() {
        let path = PathBuf::from("~/test/path");
        let expanded = expand_tilde(&path);

        if dirs::home_dir().is_some() {
            assert!(!expanded.to_str().unwrap().starts_with("~/"));
        }
    }

    #[test]
    fn expand_tilde_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        assert_eq!(expand_tilde(&path), path);
    }
}
