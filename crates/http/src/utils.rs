//! Utility macros used internally by the crate.

/// A macro for early returns with an error if a condition is not met.
///
/// Similar to `assert!`, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(parts.len() == 3, ParseError::malformed_request_line("wrong field count"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
