//! Region handle type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Numeric key identifying a region by its grid coordinates.
///
/// The upper 32 bits hold the region's `x` world coordinate and the lower
/// 32 bits hold `y`. The handle is the stable key under which a region's
/// capability record is persisted, rendered as its decimal value.
///
/// # Example
///
/// ```
/// use regcap_types::RegionHandle;
///
/// let handle = RegionHandle::from_coords(1000, 2000);
/// assert_eq!(handle.x(), 1000);
/// assert_eq!(handle.y(), 2000);
/// assert_eq!(handle.as_u64(), (1000u64 << 32) | 2000);
///
/// let parsed: RegionHandle = handle.to_string().parse().unwrap();
/// assert_eq!(parsed, handle);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionHandle(u64);

impl RegionHandle {
    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Packs world coordinates into a handle.
    #[must_use]
    pub const fn from_coords(x: u32, y: u32) -> Self {
        Self(((x as u64) << 32) | y as u64)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the `x` world coordinate.
    #[must_use]
    pub const fn x(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the `y` world coordinate.
    #[must_use]
    pub const fn y(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Returns `(x, y)`.
    #[must_use]
    pub const fn coords(self) -> (u32, u32) {
        (self.x(), self.y())
    }
}

impl From<u64> for RegionHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<RegionHandle> for u64 {
    fn from(handle: RegionHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a region handle string is not a decimal `u64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRegionHandleError(ParseIntError);

impl fmt::Display for ParseRegionHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid region handle: {}", self.0)
    }
}

impl std::error::Error for ParseRegionHandleError {}

impl FromStr for RegionHandle {
    type Err = ParseRegionHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(ParseRegionHandleError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_round_trip_through_handle() {
        let handle = RegionHandle::from_coords(u32::MAX, 7);
        assert_eq!(handle.coords(), (u32::MAX, 7));
    }

    #[test]
    fn small_handle_is_all_y() {
        let handle = RegionHandle::new(1000);
        assert_eq!(handle.x(), 0);
        assert_eq!(handle.y(), 1000);
    }

    #[test]
    fn display_is_decimal_key() {
        assert_eq!(RegionHandle::new(1000).to_string(), "1000");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "region-9".parse::<RegionHandle>().unwrap_err();
        assert!(err.to_string().contains("invalid region handle"));
    }

    #[test]
    fn parse_trims_whitespace() {
        let handle: RegionHandle = " 42 ".parse().unwrap();
        assert_eq!(handle.as_u64(), 42);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&RegionHandle::new(1000)).unwrap();
        assert_eq!(json, "1000");
    }
}
