//! Generic key/value object store abstraction.
//!
//! Values are opaque strings addressed by `(scope, kind, key)`. The
//! capability issuer only ever writes under [`Scope::GLOBAL`], but the
//! scope is part of the address so a backing store can be shared with
//! other grid services.

use super::StorageError;
use regcap_types::Scope;
use std::future::Future;

/// Generic object store.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across
/// async tasks. Timeouts and retries are the implementation's concern.
///
/// # Example
///
/// ```no_run
/// use regcap_runtime::{GenericStore, Scope, StorageError};
///
/// async fn roundtrip(store: &impl GenericStore) -> Result<(), StorageError> {
///     store.add(Scope::GLOBAL, "Notes", "1", "hello").await?;
///     assert_eq!(store.get(Scope::GLOBAL, "Notes", "1").await?.as_deref(), Some("hello"));
///     Ok(())
/// }
/// ```
pub trait GenericStore: Send + Sync {
    /// Stores `value`, overwriting any previous value at the same address.
    fn add(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Loads the value at an address, `None` when absent.
    fn get(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Loads every value stored under `(scope, kind)`, ordered by key.
    fn get_all(
        &self,
        scope: Scope,
        kind: &str,
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    /// Removes the value at an address.
    ///
    /// Returns `true` if a value was removed. Removing an absent key is
    /// not an error.
    fn remove(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}
