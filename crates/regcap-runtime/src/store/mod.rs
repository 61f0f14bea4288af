//! Capability persistence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CapabilityIssuer                         │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RecordStore<S>   CapabilityRecord <-> JSON, keyed by       │
//! │                   region handle under GridRegistrationUrls  │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  GenericStore trait  (scope, kind, key) -> String           │
//! └─────────────────────────────────────────────────────────────┘
//!           ┌────────────────┴────────────────┐
//!           ▼                                 ▼
//!     ┌──────────┐                     ┌──────────┐
//!     │  Memory  │                     │  Local   │
//!     │  Store   │                     │  File    │
//!     └──────────┘                     └──────────┘
//! ```

mod error;
mod generic;
mod local;
mod memory;
mod record;

pub use error::StorageError;
pub use generic::GenericStore;
pub use local::LocalFileStore;
pub use memory::MemoryStore;
pub use record::{CapabilityRecord, RecordStore};
