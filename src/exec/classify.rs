//! Transient-failure classification

/// Substrings (lowercase) marking a failure worth retrying
const RETRYABLE_MARKERS: &[&str] = &[
    // throttling
    "throttling",
    "rate limit",
    "too many requests",
    // service-side
    "internal error",
    "service unavailable",
    "timeout",
    // http status
    "429",
    "502",
    "503",
    "504",
];

/// Decide whether a failed call should be attempted again
///
/// Matching is case-insensitive over the raw error text. Anything not
/// recognised, including authentication and permission failures, is final.
pub fn is_retryable(raw_error: &str, _exit_status: i32) -> bool {
    let text = raw_error.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_is_case_insensitive() {
        assert!(is_retryable("Throttling: rate exceeded", 1));
        assert!(is_retryable("THROTTLING", 1));
        assert!(is_retryable(
            "An error occurred (ThrottlingException) when calling the ListAnalyses operation",
            254
        ));
    }

    #[test]
    fn rate_limit_variants() {
        assert!(is_retryable("rate limit exceeded", 1));
        assert!(is_retryable("Too Many Requests", 1));
    }

    #[test]
    fn service_side_failures() {
        assert!(is_retryable("Internal Error", 1));
        assert!(is_retryable("Service Unavailable", 1));
        assert!(is_retryable("Read timeout on endpoint URL", 255));
    }

    #[test]
    fn http_status_codes() {
        for code in ["429", "502", "503", "504"] {
            assert!(is_retryable(&format!("HTTP {code}"), 1), "{code}");
        }
        assert!(!is_retryable("HTTP 500", 1));
        assert!(!is_retryable("HTTP 404", 1));
    }

    #[test]
    fn auth_and_validation_errors_are_final() {
        assert!(!is_retryable("AccessDenied", 1));
        assert!(!is_retryable("AccessDeniedException: not authorized", 1));
        assert!(!is_retryable("ExpiredToken", 255));
        assert!(!is_retryable("InvalidParameterValue", 1));
        assert!(!is_retryable("", 1));
    }
}
