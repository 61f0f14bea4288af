//! Handler modules and their registry.
//!
//! A [`HandlerModule`] provides one capability per region: it mints a
//! unique URL path fragment, serves it on its port, and tears it down
//! again when the capability is revoked. Modules are registered once
//! at startup in a [`ModuleRegistry`], keyed by their unique URL name.

mod error;
mod front_door;
mod registry;

pub use error::RegistryError;
pub use front_door::{CapabilityContext, CapabilityService, FrontDoorModule};
pub use registry::ModuleRegistry;

use regcap_types::RegionHandle;

/// Capability provider for one service feature.
pub trait HandlerModule: Send + Sync {
    /// Unique name, used as the key in issued URL maps.
    fn url_name(&self) -> &str;

    /// Port the module's capability routes are served on.
    fn port(&self) -> u16;

    /// Mints a path fragment for `(session_id, region)` and starts serving
    /// it. The fragment starts with `/`. Returning a fragment minted
    /// earlier for the same region keeps that route alive across re-issue.
    fn mint_url(&self, session_id: &str, region: RegionHandle) -> String;

    /// Starts serving a fragment minted before a restart.
    fn reattach(&self, session_id: &str, region: RegionHandle, fragment: &str);

    /// Releases module-side state for a fragment whose route was removed.
    fn deregister(&self, _fragment: &str) {}
}
