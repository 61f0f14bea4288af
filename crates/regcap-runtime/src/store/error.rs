//! Storage error types.

use regcap_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Kind or key unusable as a storage name.
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    /// Storage directory creation failed.
    #[error("failed to create storage directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Version incompatibility.
    #[error("version incompatible: file version {file_version}, supported {supported_version}")]
    VersionIncompatible {
        file_version: u32,
        supported_version: u32,
    },

    /// Failure reported by a store backend.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Creates an InvalidKey error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Creates a DirectoryCreation error.
    pub fn directory_creation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            source,
        }
    }

    /// Creates a Backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

impl ErrorCode for StorageError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "STORAGE_IO",
            Self::Serialization(_) => "STORAGE_SERIALIZATION",
            Self::InvalidKey(_) => "STORAGE_INVALID_KEY",
            Self::DirectoryCreation { .. } => "STORAGE_DIRECTORY_CREATION",
            Self::VersionIncompatible { .. } => "STORAGE_VERSION_INCOMPATIBLE",
            Self::Backend(_) => "STORAGE_BACKEND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcap_types::assert_error_codes;

    #[test]
    fn invalid_key_error() {
        let err = StorageError::invalid_key("../etc");
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(err.to_string().contains("../etc"));
    }

    #[test]
    fn is_recoverable() {
        assert!(StorageError::backend("timeout").is_recoverable());
        assert!(!StorageError::VersionIncompatible {
            file_version: 2,
            supported_version: 1
        }
        .is_recoverable());
    }

    #[test]
    fn all_error_codes() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let json = serde_json::from_str::<u32>("x").unwrap_err();
        let errors = [
            StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")),
            StorageError::Serialization(json),
            StorageError::invalid_key(""),
            StorageError::directory_creation("/nope", io),
            StorageError::VersionIncompatible {
                file_version: 9,
                supported_version: 1,
            },
            StorageError::backend("down"),
        ];
        assert_error_codes(&errors, "STORAGE_");
    }
}
