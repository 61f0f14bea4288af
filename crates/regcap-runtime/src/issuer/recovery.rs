//! Startup recovery outcome.

use regcap_types::RegionHandle;

/// A persisted route whose module is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingModule {
    pub module: String,
    pub region: RegionHandle,
}

/// What [`CapabilityIssuer::recover`](super::CapabilityIssuer::recover) found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records decoded successfully.
    pub records_loaded: usize,
    /// Routes handed back to their modules.
    pub routes_reattached: usize,
    /// Routes skipped because their module is not registered.
    pub missing_modules: Vec<MissingModule>,
    /// Decode errors for records that could not be read.
    pub undecodable: Vec<String>,
}

impl RecoveryReport {
    /// Returns `true` if every persisted route was reattached.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_modules.is_empty() && self.undecodable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_clean() {
        assert!(RecoveryReport::default().is_clean());
    }

    #[test]
    fn missing_module_is_not_clean() {
        let report = RecoveryReport {
            missing_modules: vec![MissingModule {
                module: "asset".into(),
                region: RegionHandle::new(1),
            }],
            ..Default::default()
        };
        assert!(!report.is_clean());
    }
}
