//! Error types for feed fetching.

use thiserror::Error;

use crate::poller::FeedKind;

/// Feed fetch errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// No webhook URL configured for the feed
    #[error("{feed} feed URL is not configured")]
    NotConfigured { feed: FeedKind },

    /// Transport failure (DNS, connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a 5xx status
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// Server answered with any other non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body is not valid JSON
    #[error("Invalid JSON from {feed} feed: {source}")]
    Decode {
        feed: FeedKind,
        #[source]
        source: serde_json::Error,
    },

    /// The background poller has shut down
    #[error("Feed poller is not running")]
    PollerStopped,
}

impl FeedError {
    /// Classify a non-success HTTP status.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            500..=599 => FeedError::ServerError { status, body },
            _ => FeedError::Status { status, body },
        }
    }

    /// Check if this error is a network-related error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, FeedError::Http(_) | FeedError::ServerError { .. })
    }

    /// Get a user-friendly error message.
    pub fn friendly_message(&self) -> String {
        match self {
            FeedError::NotConfigured { feed } => {
                format!("The {} webhook URL is not configured.", feed)
            }
            FeedError::Http(e) if e.is_timeout() => {
                "Request timed out. Check your connection.".to_string()
            }
            FeedError::Http(e) if e.is_connect() => {
                "Could not connect to the webhook. Check your network.".to_string()
            }
            FeedError::Http(e) => format!("Connection failed: {}", e),
            FeedError::ServerError { status, .. } => {
                format!("The webhook server failed ({}). Try again shortly.", status)
            }
            FeedError::Status { status, .. } => format!("The webhook answered HTTP {}.", status),
            FeedError::Decode { feed, .. } => {
                format!("The {} feed returned data that could not be read.", feed)
            }
            FeedError::PollerStopped => "Background refresh has stopped.".to_string(),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = FeedError::from_http_status(503, "unavailable");
        assert!(matches!(err, FeedError::ServerError { status: 503, .. }));
        assert!(err.is_network_error());

        let err = FeedError::from_http_status(404, "not found");
        assert!(matches!(err, FeedError::Status { status: 404, .. }));
        assert!(!err.is_network_error());
        assert_eq!(err.friendly_message(), "The webhook answered HTTP 404.");
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "x".repeat(1000);
        match FeedError::from_http_status(500, &body) {
            FeedError::ServerError { body, .. } => assert!(body.chars().count() <= 201),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_configured_message() {
        let err = FeedError::NotConfigured {
            feed: FeedKind::Usage,
        };
        assert!(err.to_string().contains("usage"));
        assert!(err.friendly_message().contains("not configured"));
    }
}
