//! Permission model errors.

use regcap_types::ErrorCode;
use thiserror::Error;

/// Errors raised while building or querying the permission model.
///
/// Note that authorization *denials* are never errors: an unknown region or
/// an unconfigured level simply resolves to a deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A threat level name did not match any known level.
    #[error("unknown threat level: '{0}'")]
    UnknownThreatLevel(String),
}

impl AuthError {
    /// Creates an unknown threat level error.
    pub fn unknown_threat_level(name: impl Into<String>) -> Self {
        Self::UnknownThreatLevel(name.into())
    }
}

impl ErrorCode for AuthError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownThreatLevel(_) => "AUTH_UNKNOWN_THREAT_LEVEL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcap_types::assert_error_code;

    #[test]
    fn unknown_level_display() {
        let err = AuthError::unknown_threat_level("Severe");
        assert_eq!(err.to_string(), "unknown threat level: 'Severe'");
        assert_error_code(&err, "AUTH_");
        assert!(!err.is_recoverable());
    }
}
