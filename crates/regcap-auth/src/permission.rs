//! Permitted-function sets.

use std::collections::HashSet;

/// Set of function names permitted at one threat level.
///
/// Built once at startup from a whitespace-separated list and never
/// mutated afterwards.
///
/// # Example
///
/// ```
/// use regcap_auth::PermissionSet;
///
/// let set = PermissionSet::parse("GetFolder  GetItem\tAddItem");
/// assert!(set.contains("GetItem"));
/// assert!(!set.contains("DeleteFolder"));
/// assert_eq!(set.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    functions: HashSet<String>,
}

impl PermissionSet {
    /// Creates an empty set (denies everything).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a whitespace-separated function list.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self {
            functions: list.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Returns `true` if `function` is permitted.
    #[must_use]
    pub fn contains(&self, function: &str) -> bool {
        self.functions.contains(function)
    }

    /// Returns the number of permitted functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if no function is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns the permitted function names in sorted order.
    #[must_use]
    pub fn functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().map(Into::into).collect(),
        }
    }
}
