//! Region directory abstraction.
//!
//! The permission engine reads a region's threat-level override from the
//! grid's region directory. The directory itself is owned by the grid
//! service; this module only defines the lookup seam plus an in-memory
//! implementation for tests and static deployments.

use parking_lot::RwLock;
use regcap_types::RegionHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Region metadata relevant to authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Region handle.
    pub handle: RegionHandle,
    /// Human-readable region name.
    pub name: String,
    /// Free-form threat level override; empty means "use the default".
    pub threat_level: String,
}

impl RegionInfo {
    /// Creates region metadata with no threat level override.
    #[must_use]
    pub fn new(handle: RegionHandle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            threat_level: String::new(),
        }
    }

    /// Sets the threat level override.
    #[must_use]
    pub fn with_threat_level(mut self, level: impl Into<String>) -> Self {
        self.threat_level = level.into();
        self
    }
}

/// Lookup of region metadata by handle.
///
/// # Example
///
/// ```
/// use regcap_auth::{InMemoryRegionDirectory, RegionDirectory, RegionInfo};
/// use regcap_types::RegionHandle;
///
/// let dir = InMemoryRegionDirectory::new();
/// dir.insert(RegionInfo::new(RegionHandle::new(1000), "Sandbox").with_threat_level("Low"));
///
/// let region = dir.find_region_by_handle(RegionHandle::new(1000)).unwrap();
/// assert_eq!(region.threat_level, "Low");
/// assert!(dir.find_region_by_handle(RegionHandle::new(1)).is_none());
/// ```
pub trait RegionDirectory: Send + Sync {
    /// Returns the region registered under `handle`, if any.
    fn find_region_by_handle(&self, handle: RegionHandle) -> Option<RegionInfo>;
}

/// Thread-safe, in-memory [`RegionDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryRegionDirectory {
    regions: RwLock<HashMap<RegionHandle, RegionInfo>>,
}

impl InMemoryRegionDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-populated with `regions`.
    #[must_use]
    pub fn with_regions(regions: impl IntoIterator<Item = RegionInfo>) -> Self {
        let dir = Self::new();
        for region in regions {
            dir.insert(region);
        }
        dir
    }

    /// Inserts or replaces a region.
    pub fn insert(&self, region: RegionInfo) {
        self.regions.write().insert(region.handle, region);
    }

    /// Removes a region. Returns the removed entry.
    pub fn remove(&self, handle: RegionHandle) -> Option<RegionInfo> {
        self.regions.write().remove(&handle)
    }

    /// Returns the number of known regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    /// Returns `true` if no regions are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }
}

impl RegionDirectory for InMemoryRegionDirectory {
    fn find_region_by_handle(&self, handle: RegionHandle) -> Option<RegionInfo> {
        self.regions.read().get(&handle).cloned()
    }
}
