//! Issuer errors.

use crate::store::StorageError;
use regcap_types::ErrorCode;
use thiserror::Error;

/// Capability issuer error.
#[derive(Debug, Error)]
pub enum IssuerError {
    /// The capability store failed.
    #[error("capability store error: {0}")]
    Storage(#[from] StorageError),
}

impl ErrorCode for IssuerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "ISSUER_STORAGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcap_types::assert_error_codes;

    #[test]
    fn all_error_codes() {
        assert_error_codes(
            &[
                IssuerError::from(StorageError::backend("down")),
                IssuerError::from(StorageError::invalid_key("")),
            ],
            "ISSUER_",
        );
    }

    #[test]
    fn recoverability_follows_storage() {
        assert!(IssuerError::from(StorageError::backend("timeout")).is_recoverable());
        assert!(!IssuerError::from(StorageError::invalid_key("")).is_recoverable());
    }
}
