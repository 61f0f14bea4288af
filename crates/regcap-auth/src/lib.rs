//! Permission primitives for regcap.
//!
//! Region processes call back into grid services through capability URLs.
//! Each call names a *function*; this crate decides whether the calling
//! region may invoke it.
//!
//! # Threat-Level Model
//!
//! ```text
//! function ──┐
//!            ├─► resolve_threat_level ──► ThreatLevel ──► PermissionSet ∋ function ?
//! region ────┘
//! ```
//!
//! | Step | Source | Precedence |
//! |------|--------|------------|
//! | Region unknown | [`RegionDirectory`] miss | resolves to [`ThreatLevel::None`] |
//! | Region level | [`RegionInfo::threat_level`] | base |
//! | Default level | `DefaultRegionThreatLevel` | when region has none |
//! | Function override | per-function config entry | wins over both |
//!
//! Checks are set membership, never ordinal comparison: a function listed
//! only under `Low` is *not* permitted at `Full`.
//!
//! # Crate Architecture
//!
//! ```text
//! regcap-types  (RegionHandle)
//!     ↑
//! regcap-auth  ◄── THIS CRATE
//! (ThreatLevel, PermissionSet, PermissionEngine, RegionDirectory)
//!     ↑
//! regcap-runtime (CapabilityIssuer)
//! ```

pub mod directory;
pub mod engine;
pub mod error;
pub mod permission;
pub mod threat;

pub use directory::{InMemoryRegionDirectory, RegionDirectory, RegionInfo};
pub use engine::PermissionEngine;
pub use error::AuthError;
pub use permission::PermissionSet;
pub use threat::ThreatLevel;

pub use regcap_types::RegionHandle;
