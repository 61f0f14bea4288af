//! Core types for regcap.
//!
//! This crate provides the foundational identifier types shared by every
//! regcap crate.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  regcap-types   : RegionHandle, Scope, ErrorCode  ◄── HERE   │
//! │  regcap-auth    : ThreatLevel, PermissionEngine             │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  regcap-runtime : store, router, modules, CapabilityIssuer  │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  regcap-cli     : Command-line interface                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use regcap_types::{RegionHandle, Scope};
//!
//! let handle = RegionHandle::from_coords(256_000, 256_000);
//! assert_eq!(handle.coords(), (256_000, 256_000));
//! assert!(Scope::GLOBAL.is_global());
//! ```

mod error;
mod region;
mod scope;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use region::{ParseRegionHandleError, RegionHandle};
pub use scope::Scope;
