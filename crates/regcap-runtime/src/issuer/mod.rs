//! Capability issuance, authorization and recovery.
//!
//! # Flow
//!
//! ```text
//! issue(session, region)
//!   ├─ for each module (registration order)
//!   │    fragment = module.mint_url(session, region)
//!   │    url      = balancer.next_host() + ":" + port + fragment
//!   ├─ persist { session, region, fragments, now + timeout }
//!   └─ release the routes of the record it replaced
//!
//! authorize(session, region, function, default_level)
//!   ├─ no record            → false
//!   ├─ now > expiration     → revoke, false
//!   └─ check_permission(resolve_threat_level(..), function)
//! ```
//!
//! `issue`, `revoke` and the expiry branch of `authorize` hold a
//! per-region lock while they touch the store, so concurrent calls for
//! one region cannot interleave their read-modify-write sequences.

mod error;
mod recovery;

pub use error::IssuerError;
pub use recovery::{MissingModule, RecoveryReport};

use crate::balancer::LoadBalancer;
use crate::clock::{Clock, SystemClock};
use crate::module::{FrontDoorModule, HandlerModule, ModuleRegistry, RegistryError};
use crate::routing::HttpRouter;
use crate::store::{CapabilityRecord, GenericStore, RecordStore};
use chrono::Duration;
use parking_lot::Mutex;
use regcap_auth::PermissionEngine;
use regcap_types::RegionHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Issues, authorizes and revokes per-region capability URL sets.
///
/// Owns the module registry, the permission engine and the load
/// balancer; shares the HTTP router with the modules that serve the
/// minted routes.
pub struct CapabilityIssuer<S> {
    records: RecordStore<S>,
    registry: ModuleRegistry,
    permissions: PermissionEngine,
    balancer: LoadBalancer,
    router: Arc<dyn HttpRouter>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    // One entry per region ever touched.
    region_locks: Mutex<HashMap<RegionHandle, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: GenericStore> CapabilityIssuer<S> {
    /// Default capability lifetime in hours.
    pub const DEFAULT_TIMEOUT_HOURS: u32 = 24;

    /// Creates an issuer with no modules, no hosts and a 24 hour timeout.
    pub fn new(store: S, permissions: PermissionEngine, router: Arc<dyn HttpRouter>) -> Self {
        Self {
            records: RecordStore::new(store),
            registry: ModuleRegistry::new(),
            permissions,
            balancer: LoadBalancer::new(),
            router,
            clock: Arc::new(SystemClock),
            timeout: Duration::hours(i64::from(Self::DEFAULT_TIMEOUT_HOURS)),
            region_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the capability lifetime in hours.
    #[must_use]
    pub fn with_timeout_hours(self, hours: u32) -> Self {
        self.with_timeout(Duration::hours(i64::from(hours)))
    }

    /// Sets the capability lifetime.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the front-end hosts handed out round-robin.
    #[must_use]
    pub fn with_hosts<I, T>(self, hosts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.balancer.set_hosts(hosts);
        self
    }

    /// Returns the capability lifetime.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the module registry.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Returns the permission engine.
    pub fn permissions(&self) -> &PermissionEngine {
        &self.permissions
    }

    /// Returns the load balancer.
    pub fn balancer(&self) -> &LoadBalancer {
        &self.balancer
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        self.records.inner()
    }

    /// Registers a handler module.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] if a module with the
    /// same URL name is already registered.
    pub fn register_module(&self, module: Arc<dyn HandlerModule>) -> Result<(), RegistryError> {
        self.registry.register(module)
    }

    /// Mints and persists a fresh capability set for `region`.
    ///
    /// Returns module name → public URL. Any record previously issued
    /// for the region is replaced; its routes are released unless a module
    /// minted the same fragment again.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] if the record cannot be persisted.
    /// Nothing is advertised in that case and the freshly minted routes
    /// not held by the prior record are released again.
    pub async fn issue(
        &self,
        session_id: &str,
        region: RegionHandle,
    ) -> Result<BTreeMap<String, String>, IssuerError> {
        let lock = self.region_lock(region);
        let _guard = lock.lock().await;

        let prior = match self.records.get(region).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(%region, error = %e, "Could not load prior capability record, its routes stay registered");
                None
            }
        };

        let mut fragments = BTreeMap::new();
        let mut public = BTreeMap::new();
        for module in self.registry.all() {
            let name = module.url_name().to_string();
            let fragment = module.mint_url(session_id, region);
            let host = self.balancer.next_host();
            public.insert(name.clone(), format!("{host}:{}{fragment}", module.port()));
            fragments.insert(name, fragment);
        }

        let record = CapabilityRecord::new(
            session_id,
            region,
            fragments,
            self.clock.now() + self.timeout,
        );

        if let Err(e) = self.records.put(&record).await {
            warn!(%region, session = session_id, error = %e, "Failed to persist capabilities");
            self.release_stale(&record, prior.as_ref());
            return Err(e.into());
        }

        if let Some(prior) = prior {
            self.release_stale(&prior, Some(&record));
        }

        info!(
            %region,
            session = session_id,
            modules = public.len(),
            expiration = %record.expiration,
            "Issued capabilities"
        );
        Ok(public)
    }

    /// Removes the capability set for `region`, if any.
    ///
    /// The session id is not checked against the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] if the record cannot be read or
    /// deleted.
    pub async fn revoke(&self, session_id: &str, region: RegionHandle) -> Result<(), IssuerError> {
        let lock = self.region_lock(region);
        let _guard = lock.lock().await;

        let Some(record) = self.records.get(region).await? else {
            debug!(%region, session = session_id, "Nothing to revoke");
            return Ok(());
        };
        if record.session_id != session_id {
            debug!(%region, session = session_id, stored = %record.session_id, "Revoking under a different session");
        }

        self.remove_record(&record).await?;
        info!(%region, session = session_id, "Revoked capabilities");
        Ok(())
    }

    /// Decides whether `function` may be called on behalf of `region`.
    ///
    /// Returns `false` when the region holds no capabilities, and revokes
    /// them first when they have expired.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] if the store fails. Callers must
    /// treat an error as unauthorized; see [`is_authorized`](Self::is_authorized).
    pub async fn authorize(
        &self,
        session_id: &str,
        region: RegionHandle,
        function: &str,
        default_level: &str,
    ) -> Result<bool, IssuerError> {
        let Some(record) = self.records.get(region).await? else {
            debug!(%region, function, "No capabilities for region");
            return Ok(false);
        };

        if record.session_id != session_id {
            debug!(%region, session = session_id, stored = %record.session_id, "Session differs from issued session");
        }

        if record.is_expired_at(self.clock.now()) {
            self.expire(region).await?;
            return Ok(false);
        }

        let level = self
            .permissions
            .resolve_threat_level(function, region, default_level);
        let allowed = self.permissions.check_permission(level, function);
        debug!(%region, function, level = %level, allowed, "Authorization decided");
        Ok(allowed)
    }

    /// Fail-closed form of [`authorize`](Self::authorize).
    pub async fn is_authorized(
        &self,
        session_id: &str,
        region: RegionHandle,
        function: &str,
        default_level: &str,
    ) -> bool {
        match self
            .authorize(session_id, region, function, default_level)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(%region, function, error = %e, "Authorization failed, denying");
                false
            }
        }
    }

    /// Re-attaches every persisted capability route to its module.
    ///
    /// Nothing is re-minted and expirations are left as stored; expired
    /// records are cleaned up by the next `authorize`.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] only if the store cannot be
    /// listed. Bad records and unknown modules are reported instead.
    pub async fn recover(&self) -> Result<RecoveryReport, IssuerError> {
        let mut report = RecoveryReport::default();

        for entry in self.records.all().await? {
            let record = match entry {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable capability record");
                    report.undecodable.push(e.to_string());
                    continue;
                }
            };
            report.records_loaded += 1;

            for (name, fragment) in &record.urls {
                match self.registry.lookup(name) {
                    Some(module) => {
                        module.reattach(&record.session_id, record.region_handle, fragment);
                        report.routes_reattached += 1;
                    }
                    None => {
                        warn!(module = %name, region = %record.region_handle, "Module not registered, route not reattached");
                        report.missing_modules.push(MissingModule {
                            module: name.clone(),
                            region: record.region_handle,
                        });
                    }
                }
            }
        }

        info!(
            records = report.records_loaded,
            routes = report.routes_reattached,
            missing = report.missing_modules.len(),
            undecodable = report.undecodable.len(),
            "Recovered capabilities"
        );
        Ok(report)
    }

    /// Loads the stored record for `region`.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] if the store fails or the record
    /// cannot be decoded.
    pub async fn lookup(&self, region: RegionHandle) -> Result<Option<CapabilityRecord>, IssuerError> {
        Ok(self.records.get(region).await?)
    }

    /// Loads every decodable record, ordered by store key.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Storage`] if the store cannot be listed.
    pub async fn records(&self) -> Result<Vec<CapabilityRecord>, IssuerError> {
        let mut records = Vec::new();
        for entry in self.records.all().await? {
            match entry {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping undecodable capability record"),
            }
        }
        Ok(records)
    }

    /// Revokes an expired record under the region lock.
    ///
    /// The record is re-read first; a concurrent re-issue leaves a fresh
    /// record that must survive.
    async fn expire(&self, region: RegionHandle) -> Result<(), IssuerError> {
        let lock = self.region_lock(region);
        let _guard = lock.lock().await;

        if let Some(current) = self.records.get(region).await? {
            if current.is_expired_at(self.clock.now()) {
                self.remove_record(&current).await?;
                info!(%region, session = %current.session_id, "Expired capabilities revoked");
            }
        }
        Ok(())
    }

    async fn remove_record(&self, record: &CapabilityRecord) -> Result<(), IssuerError> {
        self.release_routes(record);
        self.records.remove(record.region_handle).await?;
        Ok(())
    }

    /// Removes each route of `record` and tells its module.
    fn release_routes(&self, record: &CapabilityRecord) {
        self.release_entries(record.region_handle, record.urls.iter());
    }

    /// Releases the routes of `stale` that `live` does not advertise.
    ///
    /// A module may mint the same fragment again for a region; that route
    /// is still in use and stays registered.
    fn release_stale(&self, stale: &CapabilityRecord, live: Option<&CapabilityRecord>) {
        let entries = stale.urls.iter().filter(|(name, fragment)| {
            live.and_then(|live| live.urls.get(*name)) != Some(*fragment)
        });
        self.release_entries(stale.region_handle, entries);
    }

    fn release_entries<'a>(
        &self,
        region: RegionHandle,
        entries: impl Iterator<Item = (&'a String, &'a String)>,
    ) {
        for (name, fragment) in entries {
            let Some(module) = self.registry.lookup(name) else {
                warn!(module = %name, %region, "Module not registered, skipping route removal");
                continue;
            };
            self.router
                .remove_handler(module.port(), FrontDoorModule::METHOD, fragment);
            module.deregister(fragment);
        }
    }

    fn region_lock(&self, region: RegionHandle) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.region_locks.lock().entry(region).or_default())
    }
}

impl<S> std::fmt::Debug for CapabilityIssuer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityIssuer")
            .field("registry", &self.registry)
            .field("permissions", &self.permissions)
            .field("balancer", &self.balancer)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteTable;
    use crate::store::MemoryStore;
    use crate::testing::{FailingStore, ManualClock, RecordingModule};
    use regcap_auth::{InMemoryRegionDirectory, RegionInfo, ThreatLevel};

    const REGION: RegionHandle = RegionHandle::new(1000);

    fn engine() -> PermissionEngine {
        let regions = InMemoryRegionDirectory::with_regions([
            RegionInfo::new(REGION, "Sandbox").with_threat_level("Low")
        ]);
        let mut engine = PermissionEngine::new(Arc::new(regions));
        engine.load_level(ThreatLevel::Low, "GetFolder GetItem");
        engine
    }

    fn issuer_with<S: GenericStore>(store: S) -> (CapabilityIssuer<S>, Arc<ManualClock>) {
        let (issuer, clock, _module) = issuer_and_module(store);
        (issuer, clock)
    }

    fn issuer_and_module<S: GenericStore>(
        store: S,
    ) -> (CapabilityIssuer<S>, Arc<ManualClock>, Arc<RecordingModule>) {
        let clock = Arc::new(ManualClock::default());
        let module = Arc::new(RecordingModule::new("inventory", 8003));
        let issuer = CapabilityIssuer::new(store, engine(), Arc::new(RouteTable::new()))
            .with_clock(clock.clone())
            .with_hosts(["http://a", "http://b"]);
        issuer.register_module(module.clone()).unwrap();
        (issuer, clock, module)
    }

    #[tokio::test]
    async fn issue_composes_host_port_fragment() {
        let (issuer, _clock) = issuer_with(MemoryStore::new());

        let urls = issuer.issue("s", REGION).await.unwrap();
        assert_eq!(urls["inventory"], "http://a:8003/CAPS/inventory/1/");

        let record = issuer.lookup(REGION).await.unwrap().unwrap();
        assert_eq!(record.urls["inventory"], "/CAPS/inventory/1/");
    }

    #[tokio::test]
    async fn no_modules_issues_empty_set() {
        let store = MemoryStore::new();
        let issuer = CapabilityIssuer::new(store, engine(), Arc::new(RouteTable::new()));

        let urls = issuer.issue("s", REGION).await.unwrap();
        assert!(urls.is_empty());
        assert!(issuer.lookup(REGION).await.unwrap().unwrap().urls.is_empty());
    }

    #[tokio::test]
    async fn timeout_is_configurable() {
        let (issuer, clock) = issuer_with(MemoryStore::new());
        let issuer = issuer.with_timeout_hours(2);

        issuer.issue("s", REGION).await.unwrap();
        let record = issuer.lookup(REGION).await.unwrap().unwrap();
        assert_eq!(record.expiration - clock.now(), Duration::hours(2));
    }

    #[tokio::test]
    async fn expiry_boundary_is_exclusive() {
        let (issuer, clock) = issuer_with(MemoryStore::new());
        issuer.issue("s", REGION).await.unwrap();

        clock.advance(Duration::hours(24));
        assert!(issuer.authorize("s", REGION, "GetFolder", "").await.unwrap());

        clock.advance(Duration::seconds(1));
        assert!(!issuer.authorize("s", REGION, "GetFolder", "").await.unwrap());
        assert!(issuer.lookup(REGION).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_id_is_not_compared() {
        let (issuer, _clock) = issuer_with(MemoryStore::new());
        issuer.issue("issued", REGION).await.unwrap();

        assert!(issuer
            .authorize("someone-else", REGION, "GetFolder", "")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn persistence_failure_advertises_nothing() {
        let store = FailingStore::new(MemoryStore::new());
        let (issuer, _clock, module) = issuer_and_module(store.clone());
        store.fail_writes(true);

        let err = issuer.issue("s", REGION).await.unwrap_err();
        assert!(matches!(err, IssuerError::Storage(_)));
        assert!(issuer.lookup(REGION).await.unwrap().is_none());

        // The route minted for the failed issue was released again.
        assert_eq!(module.minted(), vec!["/CAPS/inventory/1/"]);
        assert_eq!(module.deregistered(), vec!["/CAPS/inventory/1/"]);
    }

    #[tokio::test]
    async fn read_failure_denies() {
        let store = FailingStore::new(MemoryStore::new());
        let (issuer, _clock) = issuer_with(store.clone());
        issuer.issue("s", REGION).await.unwrap();

        store.fail_reads(true);
        assert!(issuer.authorize("s", REGION, "GetFolder", "").await.is_err());
        assert!(!issuer.is_authorized("s", REGION, "GetFolder", "").await);
    }

    #[tokio::test]
    async fn revoke_unknown_region_is_noop() {
        let (issuer, _clock) = issuer_with(MemoryStore::new());
        issuer.revoke("s", RegionHandle::new(42)).await.unwrap();
    }

    #[tokio::test]
    async fn records_skips_undecodable() {
        let store = MemoryStore::new();
        let (issuer, _clock) = issuer_with(store.clone());
        issuer.issue("s", REGION).await.unwrap();
        store
            .add(regcap_types::Scope::GLOBAL, CapabilityRecord::KIND, "7", "garbage")
            .await
            .unwrap();

        let records = issuer.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region_handle, REGION);
    }
}
