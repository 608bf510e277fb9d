//! Error types for scraping operations.
//!
//! Only I/O-level failures surface as errors. Missing or malformed markup is
//! never an error: extraction degrades to absent fields instead.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that can occur while fetching or extracting novel content.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network, DNS or connection failure during a single fetch attempt.
    #[error("Transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response.
    #[error("HTTP {status} {status_text} fetching {url}")]
    HttpStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    /// A single attempt exceeded its timeout.
    #[error("Timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },

    /// Headless browser failure (launch, page creation, navigation).
    #[error("Browser error: {0}")]
    Browser(String),

    /// All retry attempts consumed. Terminal.
    #[error("Failed to fetch {url} after {attempts} attempts: {cause}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        #[source]
        cause: Box<ScrapeError>,
    },

    /// Source id not present in the registry.
    #[error("Unknown source: {id}")]
    UnknownSource { id: String },

    /// Site decoder table failed validation.
    #[error("Invalid decoder for {source_id}: {reason}")]
    InvalidDecoder { source_id: String, reason: String },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Whether a fetch attempt that failed with this error may be retried.
    ///
    /// HTTP status failures are retried alongside transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScrapeError::Transport { .. }
                | ScrapeError::HttpStatus { .. }
                | ScrapeError::Timeout { .. }
                | ScrapeError::Browser(_)
        )
    }

    /// HTTP status code, if this error (or its final cause) carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrapeError::HttpStatus { status, .. } => Some(*status),
            ScrapeError::FetchExhausted { cause, .. } => cause.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_retryable() {
        let err = ScrapeError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_terminal_errors_are_not_retryable() {
        let err = ScrapeError::UnknownSource {
            id: "nope".to_string(),
        };
        assert!(!err.is_retryable());

        let exhausted = ScrapeError::FetchExhausted {
            url: "https://example.com".to_string(),
            attempts: 3,
            cause: Box::new(ScrapeError::HttpStatus {
                url: "https://example.com".to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            }),
        };
        assert!(!exhausted.is_retryable());
        assert_eq!(exhausted.status(), Some(404));
        assert!(exhausted.to_string().contains("after 3 attempts"));
    }
}
