//! Configuration types.
//!
//! Section and key names match the grid's established configuration
//! surface (`[Configuration] HostNames`, `[RegionPermissions] DefaultTimeout`,
//! ...), so existing deployment files load unchanged. All types implement
//! [`Default`] for compile-time fallback values.

use super::default_store_path;
use regcap_auth::{PermissionEngine, RegionDirectory, RegionInfo, ThreatLevel};
use regcap_types::RegionHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Main configuration structure after merging all layers.
///
/// # Example
///
/// ```
/// use regcap_runtime::config::RegcapConfig;
///
/// let config = RegcapConfig::from_toml(r#"
/// [Configuration]
/// HostNames = "http://a, http://b"
///
/// [RegionPermissions]
/// Threat_Level_Low = "GetFolder GetItem"
/// DeleteFolder = "High"
/// "#).unwrap();
///
/// assert_eq!(config.configuration.host_list(), vec!["http://a", "http://b"]);
/// assert_eq!(config.region_permissions.default_timeout, 24);
/// assert_eq!(config.region_permissions.function_overrides["DeleteFolder"], "High");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegcapConfig {
    /// Front-end host configuration.
    #[serde(rename = "Configuration")]
    pub configuration: GridConfig,

    /// Threat-level permissions and capability lifetime.
    #[serde(rename = "RegionPermissions")]
    pub region_permissions: RegionPermissionsConfig,

    /// Capability store location.
    #[serde(rename = "Store")]
    pub store: StoreConfig,

    /// Handler modules registered at startup, in registration order.
    #[serde(rename = "Modules", skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleConfig>,

    /// Statically known regions seeding the region directory.
    #[serde(rename = "Regions", skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionConfig>,
}

impl RegcapConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serializes to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Returns the configured regions as directory entries.
    #[must_use]
    pub fn region_infos(&self) -> Vec<RegionInfo> {
        self.regions.iter().map(RegionConfig::to_region_info).collect()
    }
}

/// `[Configuration]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Comma-separated front-end base URLs handed out round-robin.
    #[serde(rename = "HostNames")]
    pub host_names: String,
}

impl GridConfig {
    /// Default host list.
    pub const DEFAULT_HOST_NAMES: &'static str = "http://localhost";

    /// Splits `HostNames` into individual hosts, dropping blanks.
    #[must_use]
    pub fn host_list(&self) -> Vec<String> {
        self.host_names
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            host_names: Self::DEFAULT_HOST_NAMES.to_string(),
        }
    }
}

/// `[RegionPermissions]` section.
///
/// Keys other than the recognised ones are per-function threat level
/// overrides (`GetFolder = "High"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionPermissionsConfig {
    /// Hours before an issued capability set expires.
    #[serde(rename = "DefaultTimeout")]
    pub default_timeout: u32,

    /// Level for regions that carry no override of their own.
    #[serde(rename = "DefaultRegionThreatLevel")]
    pub default_region_threat_level: String,

    #[serde(rename = "Threat_Level_None", skip_serializing_if = "String::is_empty")]
    pub threat_level_none: String,

    #[serde(rename = "Threat_Level_Low", skip_serializing_if = "String::is_empty")]
    pub threat_level_low: String,

    #[serde(rename = "Threat_Level_Medium", skip_serializing_if = "String::is_empty")]
    pub threat_level_medium: String,

    #[serde(rename = "Threat_Level_High", skip_serializing_if = "String::is_empty")]
    pub threat_level_high: String,

    #[serde(rename = "Threat_Level_Full", skip_serializing_if = "String::is_empty")]
    pub threat_level_full: String,

    /// Per-function threat level overrides.
    #[serde(flatten)]
    pub function_overrides: BTreeMap<String, String>,
}

impl RegionPermissionsConfig {
    /// Default capability lifetime in hours.
    pub const DEFAULT_TIMEOUT_HOURS: u32 = 24;

    /// Returns the raw function list configured for `level`.
    #[must_use]
    pub fn level_list(&self, level: ThreatLevel) -> &str {
        match level {
            ThreatLevel::None => &self.threat_level_none,
            ThreatLevel::Low => &self.threat_level_low,
            ThreatLevel::Medium => &self.threat_level_medium,
            ThreatLevel::High => &self.threat_level_high,
            ThreatLevel::Full => &self.threat_level_full,
        }
    }

    /// Builds the permission engine described by this section.
    ///
    /// Every level gets a set, empty when its list is absent.
    #[must_use]
    pub fn build_engine(&self, regions: Arc<dyn RegionDirectory>) -> PermissionEngine {
        let mut engine = PermissionEngine::new(regions)
            .with_default_region_level(self.default_region_threat_level.clone());

        for level in ThreatLevel::ALL {
            engine.load_level(level, self.level_list(level));
        }
        for (function, level) in &self.function_overrides {
            engine.set_function_override(function.clone(), level.clone());
        }

        engine
    }
}

impl Default for RegionPermissionsConfig {
    fn default() -> Self {
        Self {
            default_timeout: Self::DEFAULT_TIMEOUT_HOURS,
            default_region_threat_level: PermissionEngine::DEFAULT_REGION_THREAT_LEVEL.to_string(),
            threat_level_none: String::new(),
            threat_level_low: String::new(),
            threat_level_medium: String::new(),
            threat_level_high: String::new(),
            threat_level_full: String::new(),
            function_overrides: BTreeMap::new(),
        }
    }
}

/// `[Store]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of the file-backed capability store.
    #[serde(rename = "Path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Returns the configured path or `~/.regcap/store`.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_store_path)
    }
}

/// One `[[Modules]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Unique module URL name.
    #[serde(rename = "Name")]
    pub name: String,

    /// Port the module's capability endpoints are served on.
    #[serde(rename = "Port")]
    pub port: u16,
}

/// One `[[Regions]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionConfig {
    #[serde(rename = "Handle")]
    pub handle: u64,

    #[serde(rename = "Name", default)]
    pub name: String,

    /// Threat level override; empty uses `DefaultRegionThreatLevel`.
    #[serde(rename = "ThreatLevel", default)]
    pub threat_level: String,
}

impl RegionConfig {
    /// Converts to a region directory entry.
    #[must_use]
    pub fn to_region_info(&self) -> RegionInfo {
        RegionInfo::new(RegionHandle::new(self.handle), self.name.clone())
            .with_threat_level(self.threat_level.clone())
    }
}
