//! Threat-level permission engine.

use crate::{PermissionSet, RegionDirectory, ThreatLevel};
use regcap_types::RegionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves function calls to threat levels and checks them against
/// per-level permitted-function sets.
///
/// Built once at startup and immutable afterwards, so it can be shared
/// across request workers without locking.
///
/// # Resolution
///
/// 1. Unknown region → [`ThreatLevel::None`].
/// 2. Region's own override, else the configured default region level,
///    else the caller-supplied default.
/// 3. A per-function override replaces the result of step 2.
///
/// # Example
///
/// ```
/// use regcap_auth::{InMemoryRegionDirectory, PermissionEngine, RegionInfo, ThreatLevel};
/// use regcap_types::RegionHandle;
/// use std::sync::Arc;
///
/// let regions = Arc::new(InMemoryRegionDirectory::with_regions([
///     RegionInfo::new(RegionHandle::new(1000), "Sandbox").with_threat_level("Low"),
/// ]));
///
/// let mut engine = PermissionEngine::new(regions);
/// engine.load_level(ThreatLevel::Low, "GetFolder GetItem");
///
/// let level = engine.resolve_threat_level("GetFolder", RegionHandle::new(1000), "None");
/// assert_eq!(level, ThreatLevel::Low);
/// assert!(engine.check_permission(level, "GetFolder"));
/// assert!(!engine.check_permission(level, "DeleteFolder"));
/// ```
pub struct PermissionEngine {
    regions: Arc<dyn RegionDirectory>,
    levels: HashMap<ThreatLevel, PermissionSet>,
    function_overrides: HashMap<String, String>,
    default_region_level: String,
}

impl PermissionEngine {
    /// Default threat level for regions without an override.
    pub const DEFAULT_REGION_THREAT_LEVEL: &'static str = "Full";

    /// Creates an engine with no permitted functions at any level.
    #[must_use]
    pub fn new(regions: Arc<dyn RegionDirectory>) -> Self {
        Self {
            regions,
            levels: HashMap::new(),
            function_overrides: HashMap::new(),
            default_region_level: Self::DEFAULT_REGION_THREAT_LEVEL.to_string(),
        }
    }

    /// Sets the level used for regions without their own override.
    #[must_use]
    pub fn with_default_region_level(mut self, level: impl Into<String>) -> Self {
        self.default_region_level = level.into();
        self
    }

    /// Parses `functions` (whitespace separated) and stores it as the
    /// permitted set for `level`, replacing any previous set.
    pub fn load_level(&mut self, level: ThreatLevel, functions: &str) {
        let set = PermissionSet::parse(functions);
        debug!(level = %level, count = set.len(), "loaded permission level");
        self.levels.insert(level, set);
    }

    /// Pins `function` to `level` regardless of the calling region.
    pub fn set_function_override(&mut self, function: impl Into<String>, level: impl Into<String>) {
        self.function_overrides.insert(function.into(), level.into());
    }

    /// Returns the configured default region level.
    #[must_use]
    pub fn default_region_level(&self) -> &str {
        &self.default_region_level
    }

    /// Returns the permitted set for `level`, if one was loaded.
    #[must_use]
    pub fn permission_set(&self, level: ThreatLevel) -> Option<&PermissionSet> {
        self.levels.get(&level)
    }

    /// Resolves the threat level governing `function` when called by the
    /// region at `handle`.
    #[must_use]
    pub fn resolve_threat_level(
        &self,
        function: &str,
        handle: RegionHandle,
        default_level: &str,
    ) -> ThreatLevel {
        let Some(region) = self.regions.find_region_by_handle(handle) else {
            debug!(region = %handle, function, "region not found, resolving to None");
            return ThreatLevel::None;
        };

        let mut level = region.threat_level.as_str();
        if level.is_empty() {
            level = self.default_region_level.as_str();
        }
        if level.is_empty() {
            level = default_level;
        }

        if let Some(pinned) = self
            .function_overrides
            .get(function)
            .filter(|l| !l.is_empty())
        {
            level = pinned.as_str();
        }

        ThreatLevel::parse_or_none(level)
    }

    /// Returns `true` if `function` is permitted at `level`.
    ///
    /// A level without a loaded set falls back to the `None` set; with no
    /// `None` set either, everything is denied.
    #[must_use]
    pub fn check_permission(&self, level: ThreatLevel, function: &str) -> bool {
        self.levels
            .get(&level)
            .or_else(|| self.levels.get(&ThreatLevel::None))
            .is_some_and(|set| set.contains(function))
    }

    /// String form of [`check_permission`](Self::check_permission); unknown
    /// names use the `None` set.
    #[must_use]
    pub fn check_permission_named(&self, level: &str, function: &str) -> bool {
        self.check_permission(ThreatLevel::parse_or_none(level), function)
    }
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine")
            .field("levels", &self.levels)
            .field("function_overrides", &self.function_overrides)
            .field("default_region_level", &self.default_region_level)
            .finish_non_exhaustive()
    }
}
