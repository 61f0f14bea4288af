//! Module registry errors.

use regcap_types::ErrorCode;
use thiserror::Error;

/// Module registration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A module with the same URL name is already registered.
    #[error("module already registered: '{0}'")]
    DuplicateModule(String),

    /// URL name is empty or not usable as a path segment.
    #[error("invalid module name: '{0}'")]
    InvalidName(String),
}

impl RegistryError {
    /// Creates a DuplicateModule error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateModule(name.into())
    }

    /// Creates an InvalidName error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateModule(_) => "REGISTRY_DUPLICATE_MODULE",
            Self::InvalidName(_) => "REGISTRY_INVALID_NAME",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcap_types::assert_error_codes;

    #[test]
    fn display_names_module() {
        let err = RegistryError::duplicate("inventory");
        assert_eq!(err.to_string(), "module already registered: 'inventory'");
    }

    #[test]
    fn all_error_codes() {
        assert_error_codes(
            &[RegistryError::duplicate("a"), RegistryError::invalid_name("")],
            "REGISTRY_",
        );
    }
}
