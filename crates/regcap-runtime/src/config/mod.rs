//! Configuration management.
//!
//! # Layers
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Environment Variables (REGCAP_*)         │  Runtime override
//! ├──────────────────────────────────────────────┤
//! │  2. Explicit config file (--config)          │  Deployment-specific
//! ├──────────────────────────────────────────────┤
//! │  3. Global Config (~/.regcap/config.toml)    │  Host defaults
//! ├──────────────────────────────────────────────┤
//! │  4. Default Values (compile-time)            │  Fallback
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `REGCAP_HOST_NAMES` | `Configuration.HostNames` | comma-separated String |
//! | `REGCAP_DEFAULT_TIMEOUT` | `RegionPermissions.DefaultTimeout` | hours (u32) |
//! | `REGCAP_DEFAULT_REGION_THREAT_LEVEL` | `RegionPermissions.DefaultRegionThreatLevel` | String |
//! | `REGCAP_STORE_PATH` | `Store.Path` | PathBuf |
//!
//! # Example Configuration
//!
//! ```toml
//! [Configuration]
//! HostNames = "http://grid-a.example,http://grid-b.example"
//!
//! [RegionPermissions]
//! DefaultTimeout = 24
//! DefaultRegionThreatLevel = "Full"
//! Threat_Level_None = ""
//! Threat_Level_Low = "GetFolder GetItem"
//! Threat_Level_Full = "GetFolder GetItem AddItem DeleteFolder"
//! # Per-function override
//! DeleteFolder = "High"
//!
//! [Store]
//! Path = "~/.regcap/store"
//!
//! [[Modules]]
//! Name = "inventory"
//! Port = 8003
//!
//! [[Regions]]
//! Handle = 1000
//! Name = "Sandbox"
//! ThreatLevel = "Low"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{
    GridConfig, ModuleConfig, RegcapConfig, RegionConfig, RegionPermissionsConfig, StoreConfig,
};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".regcap")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Default capability store directory.
pub fn default_store_path() -> std::path::PathBuf {
    default_config_dir().join("store")
}
