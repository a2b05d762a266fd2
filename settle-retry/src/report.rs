//! Fail-fast reporting for the `*_or_fail` helpers.

use std::fmt::Display;
use tracing::error;

/// Fail the calling test immediately with `err` as the message.
///
/// Test harnesses report a panic inside a `#[test]` as a failure, so the
/// message is passed through verbatim.
pub fn fail_now(err: impl Display) -> ! {
    let message = err.to_string();
    error!(error = %message, "Failing test");
    panic!("{message}")
}

/// Unwrap a result or fail the calling test with the error message.
pub fn or_fail<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fail_now(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fail_passes_value_through() {
        let value = or_fail(Ok::<_, String>(7));
        assert_eq!(value, 7);
    }

    #[test]
    #[should_panic(expected = "connection refused")]
    fn test_or_fail_panics_with_message() {
        or_fail(Err::<(), _>("connection refused"));
    }
}
