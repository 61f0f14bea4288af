//! Unified error interface for regcap.
//!
//! Every regcap error enum implements [`ErrorCode`] so that callers at the
//! service edge can map failures to stable, machine-readable codes and decide
//! whether a retry makes sense.

/// Machine-readable error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"STORAGE_NOT_FOUND"`
/// - **Namespace-prefixed**: `"CONFIG_"`, `"STORAGE_"`, `"REGISTRY_"`, `"ISSUER_"`
/// - **Stable**: codes are part of the API contract
///
/// # Example
///
/// ```
/// use regcap_types::ErrorCode;
///
/// #[derive(Debug)]
/// enum StoreError {
///     Unreachable,
///     Corrupt,
/// }
///
/// impl ErrorCode for StoreError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Unreachable => "STORE_UNREACHABLE",
///             Self::Corrupt => "STORE_CORRUPT",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Unreachable)
///     }
/// }
///
/// assert_eq!(StoreError::Unreachable.code(), "STORE_UNREACHABLE");
/// assert!(!StoreError::Corrupt.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the operation may succeed.
    ///
    /// - `true`: transient condition (I/O, contention)
    /// - `false`: requires a configuration or data fix
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the regcap conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks the expected prefix, or is not
/// UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every error in `errors` with [`assert_error_code`].
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
