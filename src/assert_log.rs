//! Assertion helper: logs a critical-severity record when a condition is
//! false, but never aborts. An invariant failure here is a bug signal,
//! not a reason to take the process down (spec §7).

/// `log` has no `CRITICAL` level above `Error`, so an assertion failure is
/// logged at `Level::Error` with an explicit prefix that makes it
/// searchable apart from ordinary error records.
pub(crate) fn assert_log(condition: bool, message: &str) {
    if !condition {
        log::error!("assertion failure: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_condition_does_not_panic_or_require_anything_else() {
        assert_log(true, "should never fire");
    }

    #[test]
    fn false_condition_does_not_panic() {
        // assert_log must never abort the process; it only logs.
        assert_log(false, "deliberately false for this test");
    }
}
