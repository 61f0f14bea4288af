//! regcap runtime - capability URL issuance and access control.
//!
//! When a simulation region joins the grid, the [`CapabilityIssuer`] mints
//! one capability URL per registered [`HandlerModule`], spreads them over
//! the configured front-end hosts with the [`LoadBalancer`], and persists
//! the resulting [`CapabilityRecord`] so that the URLs survive a restart.
//! Later calls arriving through those URLs are authorized against the
//! region's threat level by the [`PermissionEngine`](regcap_auth::PermissionEngine).
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | `RegcapConfig`, layered `ConfigLoader` |
//! | [`store`] | `GenericStore` trait, memory and file backends, `CapabilityRecord` |
//! | [`routing`] | `HttpRouter` trait and the in-process `RouteTable` |
//! | [`module`] | `HandlerModule` trait, `ModuleRegistry`, `FrontDoorModule` |
//! | [`balancer`] | Round-robin `LoadBalancer` |
//! | [`issuer`] | `CapabilityIssuer` orchestrator |
//! | [`bootstrap`] | Startup registration pass and `StartupReport` |
//!
//! # Lifecycle per region handle
//!
//! ```text
//! Unregistered ──issue──► Active ──revoke──────────► Unregistered
//!                           │
//!                           └──authorize (expired)──► Unregistered
//! ```
//!
//! # Example
//!
//! ```
//! use regcap_auth::{InMemoryRegionDirectory, PermissionEngine};
//! use regcap_runtime::{CapabilityIssuer, FrontDoorModule, MemoryStore, RouteTable};
//! use regcap_types::RegionHandle;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Arc::new(RouteTable::new());
//! let permissions = PermissionEngine::new(Arc::new(InMemoryRegionDirectory::new()));
//! let issuer = CapabilityIssuer::new(MemoryStore::new(), permissions, router.clone())
//!     .with_hosts(["http://grid.example"]);
//!
//! issuer.register_module(Arc::new(FrontDoorModule::new("inventory", 8003, router.clone())))?;
//!
//! let urls = issuer.issue("session-1", RegionHandle::new(1000)).await?;
//! assert!(urls["inventory"].starts_with("http://grid.example:8003/CAPS/inventory/"));
//! # Ok(())
//! # }
//! ```

pub mod balancer;
pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod issuer;
pub mod module;
pub mod routing;
pub mod store;
pub mod testing;

pub use balancer::LoadBalancer;
pub use bootstrap::{Bootstrap, ModuleFailure, StartupError, StartupReport};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, ConfigLoader, RegcapConfig};
pub use issuer::{CapabilityIssuer, IssuerError, MissingModule, RecoveryReport};
pub use module::{
    CapabilityContext, CapabilityService, FrontDoorModule, HandlerModule, ModuleRegistry,
    RegistryError,
};
pub use routing::{HttpRouter, RouteHandler, RouteRequest, RouteResponse, RouteTable};
pub use store::{
    CapabilityRecord, GenericStore, LocalFileStore, MemoryStore, RecordStore, StorageError,
};

pub use regcap_types::{ErrorCode, RegionHandle, Scope};
