//! Threat level type.

use crate::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named privilege tier grouping functions by sensitivity.
///
/// Levels are conceptually ordered by increasing privilege scope, but the
/// permission check is membership in the level's own function set. Names
/// are matched exactly as written in configuration (`"None"`, `"Low"`,
/// `"Medium"`, `"High"`, `"Full"`).
///
/// # Example
///
/// ```
/// use regcap_auth::ThreatLevel;
///
/// let level: ThreatLevel = "Medium".parse().unwrap();
/// assert_eq!(level, ThreatLevel::Medium);
/// assert_eq!(level.config_key(), "Threat_Level_Medium");
///
/// // Free-form values from region metadata fail closed.
/// assert_eq!(ThreatLevel::parse_or_none("medium"), ThreatLevel::None);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ThreatLevel {
    /// Most restrictive tier; the fallback for anything unresolvable.
    #[default]
    None,
    /// Low-sensitivity functions.
    Low,
    /// Medium-sensitivity functions.
    Medium,
    /// High-sensitivity functions.
    High,
    /// Everything a fully trusted region may call.
    Full,
}

impl ThreatLevel {
    /// All levels in ascending privilege order.
    pub const ALL: [ThreatLevel; 5] = [
        ThreatLevel::None,
        ThreatLevel::Low,
        ThreatLevel::Medium,
        ThreatLevel::High,
        ThreatLevel::Full,
    ];

    /// Returns the canonical level name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Full => "Full",
        }
    }

    /// Returns the configuration key holding this level's function list.
    #[must_use]
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::None => "Threat_Level_None",
            Self::Low => "Threat_Level_Low",
            Self::Medium => "Threat_Level_Medium",
            Self::High => "Threat_Level_High",
            Self::Full => "Threat_Level_Full",
        }
    }

    /// Parses a level name, resolving anything unknown to [`ThreatLevel::None`].
    #[must_use]
    pub fn parse_or_none(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::debug!(level = name, "unknown threat level, failing closed to None");
            Self::None
        })
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreatLevel {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "None" => Ok(Self::None),
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Full" => Ok(Self::Full),
            other => Err(AuthError::unknown_threat_level(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_names() {
        for level in ThreatLevel::ALL {
            assert_eq!(level.as_str().parse::<ThreatLevel>(), Ok(level));
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("full".parse::<ThreatLevel>().is_err());
        assert_eq!(ThreatLevel::parse_or_none("FULL"), ThreatLevel::None);
    }

    #[test]
    fn parse_or_none_on_empty() {
        assert_eq!(ThreatLevel::parse_or_none(""), ThreatLevel::None);
    }

    #[test]
    fn config_keys_follow_level_names() {
        for level in ThreatLevel::ALL {
            assert_eq!(level.config_key(), format!("Threat_Level_{level}"));
        }
    }

    #[test]
    fn default_is_most_restrictive() {
        assert_eq!(ThreatLevel::default(), ThreatLevel::None);
    }

    #[test]
    fn serde_uses_level_names() {
        let json = serde_json::to_string(&ThreatLevel::High).unwrap();
        assert_eq!(json, "\"High\"");
    }
}
