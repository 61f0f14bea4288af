//! Test doubles for the issuer's collaborators.
//!
//! Used by this crate's tests and available to embedders testing their
//! own wiring.

use crate::clock::Clock;
use crate::module::HandlerModule;
use crate::store::{GenericStore, StorageError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use regcap_types::{RegionHandle, Scope};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }

    /// Sets the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Default for ManualClock {
    /// Starts at 2024-01-01T00:00:00Z.
    fn default() -> Self {
        Self::new(Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// What a [`RecordingModule`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    Minted {
        session_id: String,
        region: RegionHandle,
        fragment: String,
    },
    Reattached {
        session_id: String,
        region: RegionHandle,
        fragment: String,
    },
    Deregistered {
        fragment: String,
    },
}

/// [`HandlerModule`] that records calls and mints predictable fragments
/// (`/CAPS/<name>/1/`, `/CAPS/<name>/2/`, ...). It serves no routes.
#[derive(Debug)]
pub struct RecordingModule {
    name: String,
    port: u16,
    minted: AtomicUsize,
    events: Mutex<Vec<ModuleEvent>>,
}

impl RecordingModule {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            minted: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn events(&self) -> Vec<ModuleEvent> {
        self.events.lock().clone()
    }

    /// Fragments returned by `mint_url`.
    #[must_use]
    pub fn minted(&self) -> Vec<String> {
        self.fragments(|e| match e {
            ModuleEvent::Minted { fragment, .. } => Some(fragment),
            _ => None,
        })
    }

    /// Fragments passed to `reattach`.
    #[must_use]
    pub fn reattached(&self) -> Vec<String> {
        self.fragments(|e| match e {
            ModuleEvent::Reattached { fragment, .. } => Some(fragment),
            _ => None,
        })
    }

    /// Fragments passed to `deregister`.
    #[must_use]
    pub fn deregistered(&self) -> Vec<String> {
        self.fragments(|e| match e {
            ModuleEvent::Deregistered { fragment } => Some(fragment),
            _ => None,
        })
    }

    fn fragments<F>(&self, pick: F) -> Vec<String>
    where
        F: Fn(&ModuleEvent) -> Option<&String>,
    {
        self.events.lock().iter().filter_map(pick).cloned().collect()
    }
}

impl HandlerModule for RecordingModule {
    fn url_name(&self) -> &str {
        &self.name
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn mint_url(&self, session_id: &str, region: RegionHandle) -> String {
        let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        let fragment = format!("/CAPS/{}/{n}/", self.name);
        self.events.lock().push(ModuleEvent::Minted {
            session_id: session_id.to_string(),
            region,
            fragment: fragment.clone(),
        });
        fragment
    }

    fn reattach(&self, session_id: &str, region: RegionHandle, fragment: &str) {
        self.events.lock().push(ModuleEvent::Reattached {
            session_id: session_id.to_string(),
            region,
            fragment: fragment.to_string(),
        });
    }

    fn deregister(&self, fragment: &str) {
        self.events.lock().push(ModuleEvent::Deregistered {
            fragment: fragment.to_string(),
        });
    }
}

/// [`GenericStore`] wrapper that fails on demand.
///
/// Clones share the failure switches.
#[derive(Debug, Clone)]
pub struct FailingStore<S> {
    inner: S,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes `add` and `remove` fail while set.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `get` and `get_all` fail while set.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::backend(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }
}

impl<S: GenericStore> GenericStore for FailingStore<S> {
    async fn add(
        &self,
        scope: Scope,
        kind: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.add(scope, kind, key, value).await
    }

    async fn get(&self, scope: Scope, kind: &str, key: &str) -> Result<Option<String>, StorageError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(scope, kind, key).await
    }

    async fn get_all(&self, scope: Scope, kind: &str) -> Result<Vec<String>, StorageError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_all(scope, kind).await
    }

    async fn remove(&self, scope: Scope, kind: &str, key: &str) -> Result<bool, StorageError> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.remove(scope, kind, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance(Duration::hours(25));
        assert_eq!(clock.now() - start, Duration::hours(25));
    }

    #[test]
    fn recording_module_numbers_fragments() {
        let module = RecordingModule::new("asset", 8004);
        assert_eq!(module.mint_url("s", RegionHandle::new(1)), "/CAPS/asset/1/");
        assert_eq!(module.mint_url("s", RegionHandle::new(1)), "/CAPS/asset/2/");
        module.deregister("/CAPS/asset/1/");

        assert_eq!(module.minted().len(), 2);
        assert_eq!(module.deregistered(), vec!["/CAPS/asset/1/"]);
        assert_eq!(module.events().len(), 3);
    }

    #[tokio::test]
    async fn failing_store_toggles() {
        let store = FailingStore::new(MemoryStore::new());
        store.fail_writes(true);
        assert!(store.add(Scope::GLOBAL, "K", "1", "v").await.is_err());

        store.fail_writes(false);
        store.add(Scope::GLOBAL, "K", "1", "v").await.unwrap();

        store.clone().fail_reads(true);
        assert!(matches!(
            store.get(Scope::GLOBAL, "K", "1").await,
            Err(StorageError::Backend(_))
        ));
    }
}
