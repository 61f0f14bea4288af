//! In-process store backend.

use super::{GenericStore, StorageError};
use parking_lot::RwLock;
use regcap_types::Scope;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Bucket = BTreeMap<String, String>;

/// In-memory [`GenericStore`].
///
/// Clones share the same underlying map, so a test can keep a handle
/// to the store it hands to an issuer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<RwLock<HashMap<(Scope, String), Bucket>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of values stored under `(scope, kind)`.
    #[must_use]
    pub fn count(&self, scope: Scope, kind: &str) -> usize {
        self.buckets
            .read()
            .get(&(scope, kind.to_string()))
            .map_or(0, BTreeMap::len)
    }
}

impl GenericStore for MemoryStore {
    async fn add(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        self.buckets
            .write()
            .entry((scope, kind.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, scope: Scope, kind: &str, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .buckets
            .read()
            .get(&(scope, kind.to_string()))
            .and_then(|bucket| bucket.get(key).cloned()))
    }

    async fn get_all(&self, scope: Scope, kind: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .buckets
            .read()
            .get(&(scope, kind.to_string()))
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, scope: Scope, kind: &str, key: &str) -> Result<bool, StorageError> {
        let mut buckets = self.buckets.write();
        let Some(bucket) = buckets.get_mut(&(scope, kind.to_string())) else {
            return Ok(false);
        };
        let removed = bucket.remove(key).is_some();
        if bucket.is_empty() {
            buckets.remove(&(scope, kind.to_string()));
        }
        Ok(removed)
    }
}
