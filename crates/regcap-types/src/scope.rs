//! Persistence scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Owner scope under which generic store entries are filed.
///
/// Grid-wide data (such as capability records) lives in [`Scope::GLOBAL`],
/// the nil UUID. Per-owner data uses the owner's UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Uuid);

impl Scope {
    /// The grid-wide scope.
    pub const GLOBAL: Self = Self(Uuid::nil());

    /// Creates a scope owned by `owner`.
    #[must_use]
    pub const fn owned_by(owner: Uuid) -> Self {
        Self(owner)
    }

    /// Returns the owner UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns `true` for [`Scope::GLOBAL`].
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::GLOBAL
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
