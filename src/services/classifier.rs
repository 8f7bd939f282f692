// src/services/classifier.rs

//! Fetch failure classification and run-scoped error counters.
//!
//! Unrecognized failures default to `RETRYABLE_NETWORK` so ambiguous errors are
//! retried rather than silently dropped. Callers bound retries with their own
//! budget (see `FetcherConfig::max_retries`).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{BoxedCause, ScraperError, ScraperErrorKind};

/// Substring tests in priority order; first hit decides.
const CLASSIFICATION_RULES: &[(ScraperErrorKind, &[&str])] = &[
    (
        ScraperErrorKind::RetryableTimeout,
        &["timeout", "timed out", "etimedout", "deadline exceeded"],
    ),
    (
        ScraperErrorKind::RetryableNetwork,
        &[
            "econnrefused",
            "econnreset",
            "enotfound",
            "eai_again",
            "connection",
            "socket",
            "network",
            "dns",
            "broken pipe",
            "unreachable",
        ],
    ),
    (
        ScraperErrorKind::RetryableRateLimit,
        &["429", "rate limit", "rate-limit", "too many requests"],
    ),
    (
        ScraperErrorKind::RetryableServerError,
        &[
            "500",
            "502",
            "503",
            "internal server error",
            "bad gateway",
            "service unavailable",
        ],
    ),
    (ScraperErrorKind::PermanentNotFound, &["404", "not found"]),
    (ScraperErrorKind::PermanentForbidden, &["403", "forbidden"]),
    (ScraperErrorKind::PermanentBadRequest, &["400", "bad request"]),
    (
        ScraperErrorKind::PermanentInvalidUrl,
        &[
            "invalid url",
            "malformed url",
            "invalid uri",
            "relative url without a base",
            "url parse",
            "empty host",
            "invalid domain character",
        ],
    ),
];

/// Classify a failure message. Never fails.
pub fn classify_message(message: &str) -> ScraperErrorKind {
    let lowered = message.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ScraperErrorKind::RetryableNetwork)
}

/// Turn a raw failure into a classified [`ScraperError`] keeping the cause.
///
/// The full error chain is inspected, so a timeout buried under a generic
/// "error sending request" wrapper is still seen.
pub fn classify<E>(error: E, url: &str) -> ScraperError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = error_chain_message(&error);
    let kind = classify_message(&message);
    ScraperError::new(kind, message, url).with_cause(Box::new(error) as BoxedCause)
}

fn error_chain_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// Counters for a single scan run. Safe to share between fetch workers.
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    retryable: AtomicU64,
    permanent: AtomicU64,
    recovered: AtomicU64,
    total_retries: AtomicU64,
}

/// Point-in-time copy of [`ErrorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetricsSnapshot {
    pub retryable: u64,
    pub permanent: u64,
    pub recovered: u64,
    pub total_retries: u64,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_retryable(&self) {
        self.retryable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_permanent(&self) {
        self.permanent.fetch_add(1, Ordering::Relaxed);
    }

    /// A URL that failed at least once and then succeeded.
    pub fn increment_recovered(&self) {
        self.recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.total_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a classified failure under its category.
    pub fn record(&self, error: &ScraperError) {
        if error.is_retryable() {
            self.increment_retryable();
        } else {
            self.increment_permanent();
        }
    }

    /// Zero every counter, at the start of a run.
    pub fn reset(&self) {
        self.retryable.store(0, Ordering::Relaxed);
        self.permanent.store(0, Ordering::Relaxed);
        self.recovered.store(0, Ordering::Relaxed);
        self.total_retries.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ErrorMetricsSnapshot {
        ErrorMetricsSnapshot {
            retryable: self.retryable.load(Ordering::Relaxed),
            permanent: self.permanent.load(Ordering::Relaxed),
            recovered: self.recovered.load(Ordering::Relaxed),
            total_retries: self.total_retries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const URL: &str = "https://www.up.ac.za/faculties";

    fn io(message: &str) -> std::io::Error {
        std::io::Error::other(message.to_string())
    }

    #[test]
    fn test_not_found_is_permanent() {
        let err = classify(io("404 page not found"), URL);
        assert_eq!(err.kind, ScraperErrorKind::PermanentNotFound);
        assert!(!err.is_retryable());
        assert_eq!(err.url, URL);
    }

    #[test]
    fn test_unknown_defaults_to_retryable_network() {
        let err = classify(io("xyz mystery failure"), URL);
        assert_eq!(err.kind, ScraperErrorKind::RetryableNetwork);
        assert!(err.is_retryable());
        assert!(err.original_error.is_some());
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            classify_message("Connection timed out"),
            ScraperErrorKind::RetryableTimeout
        );
        assert_eq!(
            classify_message("getaddrinfo ENOTFOUND up.ac.za"),
            ScraperErrorKind::RetryableNetwork
        );
        assert_eq!(
            classify_message("HTTP status client error (429 Too Many Requests)"),
            ScraperErrorKind::RetryableRateLimit
        );
        assert_eq!(
            classify_message("HTTP status server error (503 Service Unavailable)"),
            ScraperErrorKind::RetryableServerError
        );
        assert_eq!(
            classify_message("403 Forbidden"),
            ScraperErrorKind::PermanentForbidden
        );
        assert_eq!(
            classify_message("400 Bad Request"),
            ScraperErrorKind::PermanentBadRequest
        );
        assert_eq!(
            classify_message("Invalid URL: relative URL without a base"),
            ScraperErrorKind::PermanentInvalidUrl
        );
    }

    #[test]
    fn test_classify_inspects_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("error sending request")]
        struct Wrapper(#[source] std::io::Error);

        let err = classify(Wrapper(io("operation timed out")), URL);
        assert_eq!(err.kind, ScraperErrorKind::RetryableTimeout);
    }

    #[test]
    fn test_url_parse_error_is_invalid_url() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err = classify(parse_err, "not a url");
        assert_eq!(err.kind, ScraperErrorKind::PermanentInvalidUrl);
    }

    #[test]
    fn test_metrics_record_and_reset() {
        let metrics = ErrorMetrics::new();
        metrics.record(&classify(io("timeout"), URL));
        metrics.record(&classify(io("404"), URL));
        metrics.increment_retries();
        metrics.increment_recovered();

        assert_eq!(
            metrics.snapshot(),
            ErrorMetricsSnapshot {
                retryable: 1,
                permanent: 1,
                recovered: 1,
                total_retries: 1,
            }
        );

        metrics.reset();
        assert_eq!(metrics.snapshot(), ErrorMetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_concurrent_increments() {
        let metrics = Arc::new(ErrorMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.increment_retryable();
                        metrics.increment_retries();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.retryable, 8000);
        assert_eq!(snapshot.total_retries, 8000);
    }
}
