//! Startup wiring.
//!
//! Builds a [`CapabilityIssuer`] from [`RegcapConfig`], registers the
//! handler modules explicitly, then recovers persisted capabilities.
//! Every registration failure is collected before startup is aborted,
//! so an operator sees all conflicting module names at once.

use crate::clock::Clock;
use crate::config::RegcapConfig;
use crate::issuer::{CapabilityIssuer, IssuerError, RecoveryReport};
use crate::module::{FrontDoorModule, HandlerModule, RegistryError};
use crate::routing::HttpRouter;
use crate::store::GenericStore;
use regcap_auth::{InMemoryRegionDirectory, RegionDirectory};
use regcap_types::ErrorCode;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// A module that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    pub name: String,
    pub error: RegistryError,
}

/// Startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    /// One or more modules could not be registered.
    #[error("module registration failed: {}", FailureList(.failures))]
    ModuleRegistration { failures: Vec<ModuleFailure> },

    /// Persisted capabilities could not be listed.
    #[error("capability recovery failed: {0}")]
    Recovery(#[source] IssuerError),
}

struct FailureList<'a>(&'a [ModuleFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure.error)?;
        }
        Ok(())
    }
}

impl ErrorCode for StartupError {
    fn code(&self) -> &'static str {
        match self {
            Self::ModuleRegistration { .. } => "STARTUP_MODULE_REGISTRATION",
            Self::Recovery(_) => "STARTUP_RECOVERY",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Outcome of a successful startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Registered module names, in registration order.
    pub registered: Vec<String>,
    pub recovery: RecoveryReport,
}

/// Builder for a started [`CapabilityIssuer`].
///
/// Modules named in `[[Modules]]` become [`FrontDoorModule`]s on the
/// shared router and are registered first, followed by any modules
/// added with [`with_module`](Self::with_module).
///
/// # Example
///
/// ```
/// use regcap_runtime::{Bootstrap, MemoryStore, RegcapConfig, RouteTable};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RegcapConfig::from_toml(r#"
/// [[Modules]]
/// Name = "inventory"
/// Port = 8003
/// "#)?;
///
/// let (issuer, report) = Bootstrap::new(config, Arc::new(RouteTable::new()))
///     .start(MemoryStore::new())
///     .await?;
///
/// assert_eq!(report.registered, ["inventory"]);
/// assert_eq!(issuer.registry().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Bootstrap {
    config: RegcapConfig,
    router: Arc<dyn HttpRouter>,
    regions: Option<Arc<dyn RegionDirectory>>,
    clock: Option<Arc<dyn Clock>>,
    extra_modules: Vec<Arc<dyn HandlerModule>>,
}

impl Bootstrap {
    /// Creates a builder for `config` serving routes through `router`.
    #[must_use]
    pub fn new(config: RegcapConfig, router: Arc<dyn HttpRouter>) -> Self {
        Self {
            config,
            router,
            regions: None,
            clock: None,
            extra_modules: Vec::new(),
        }
    }

    /// Uses `regions` instead of a directory seeded from `[[Regions]]`.
    #[must_use]
    pub fn with_regions(mut self, regions: Arc<dyn RegionDirectory>) -> Self {
        self.regions = Some(regions);
        self
    }

    /// Replaces the issuer's time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Adds a module registered after the configured ones.
    #[must_use]
    pub fn with_module(mut self, module: Arc<dyn HandlerModule>) -> Self {
        self.extra_modules.push(module);
        self
    }

    /// Builds the issuer without registering modules or recovering.
    pub fn build_issuer<S: GenericStore>(&self, store: S) -> CapabilityIssuer<S> {
        let regions: Arc<dyn RegionDirectory> = match &self.regions {
            Some(regions) => Arc::clone(regions),
            None => Arc::new(InMemoryRegionDirectory::with_regions(
                self.config.region_infos(),
            )),
        };
        let permissions = self.config.region_permissions.build_engine(regions);

        let mut issuer = CapabilityIssuer::new(store, permissions, Arc::clone(&self.router))
            .with_hosts(self.config.configuration.host_list())
            .with_timeout_hours(self.config.region_permissions.default_timeout);
        if let Some(clock) = &self.clock {
            issuer = issuer.with_clock(Arc::clone(clock));
        }
        issuer
    }

    /// Returns the modules registered at startup, in order.
    #[must_use]
    pub fn modules(&self) -> Vec<Arc<dyn HandlerModule>> {
        let configured = self.config.modules.iter().map(|m| {
            Arc::new(FrontDoorModule::new(
                m.name.clone(),
                m.port,
                Arc::clone(&self.router),
            )) as Arc<dyn HandlerModule>
        });
        configured.chain(self.extra_modules.iter().cloned()).collect()
    }

    /// Builds the issuer, registers every module and recovers persisted
    /// capabilities.
    ///
    /// # Errors
    ///
    /// - [`StartupError::ModuleRegistration`] listing every module that
    ///   could not be registered.
    /// - [`StartupError::Recovery`] if the store cannot be listed.
    pub async fn start<S: GenericStore>(
        self,
        store: S,
    ) -> Result<(CapabilityIssuer<S>, StartupReport), StartupError> {
        let issuer = self.build_issuer(store);

        let mut registered = Vec::new();
        let mut failures = Vec::new();
        for module in self.modules() {
            let name = module.url_name().to_string();
            match issuer.register_module(module) {
                Ok(()) => registered.push(name),
                Err(error) => {
                    error!(module = %name, error = %error, "Module registration failed");
                    failures.push(ModuleFailure { name, error });
                }
            }
        }
        if !failures.is_empty() {
            return Err(StartupError::ModuleRegistration { failures });
        }

        let recovery = issuer.recover().await.map_err(StartupError::Recovery)?;
        info!(
            modules = registered.len(),
            hosts = issuer.balancer().hosts().len(),
            "Capability issuer started"
        );

        Ok((
            issuer,
            StartupReport {
                registered,
                recovery,
            },
        ))
    }
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("config", &self.config)
            .field("extra_modules", &self.extra_modules.len())
            .finish_non_exhaustive()
    }
}
