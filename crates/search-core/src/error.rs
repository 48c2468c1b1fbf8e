//! Search error taxonomy.

use std::fmt;

/// Errors produced by the search orchestration layer.
///
/// Cancellation is the only variant callers must always re-throw; every
/// other variant is eligible for a strategy-level fallback.
//
// Display and Error are implemented by hand because thiserror treats any
// field named `source` as the error source, and the spec requires
// `CollectionLimitExceeded { limit, source }` with a `String` source label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The caller's cancellation token fired.
    Cancelled,

    /// The per-request timeout fired before the caller cancelled.
    Timeout(u64),

    /// Non-2xx response from the commerce backend.
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A collection grew past the caller-configured hard cap.
    CollectionLimitExceeded { limit: usize, source: String },

    /// Network-level failure (DNS, connect, broken transfer).
    Transport(String),

    /// Response body did not match the expected wire shape.
    Decode(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Cancelled => write!(f, "search request cancelled"),
            SearchError::Timeout(ms) => write!(f, "search request timed out after {ms}ms"),
            SearchError::Http {
                status,
                status_text,
                body,
            } => write!(f, "upstream HTTP {status} {status_text}: {body}"),
            SearchError::CollectionLimitExceeded { limit, source } => {
                write!(f, "collected ids exceeded {limit} for {source}")
            }
            SearchError::Transport(msg) => write!(f, "transport error: {msg}"),
            SearchError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

impl SearchError {
    /// Whether this failure is a genuine cancellation.
    ///
    /// Cancellation must propagate through every fallback layer; all other
    /// variants degrade to the default backend listing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinct() {
        assert!(SearchError::Cancelled.is_cancellation());
        assert!(!SearchError::Timeout(10_000).is_cancellation());
        assert!(!SearchError::Transport("refused".into()).is_cancellation());
    }

    #[test]
    fn test_collection_limit_message_names_cap_and_source() {
        let err = SearchError::CollectionLimitExceeded {
            limit: 5000,
            source: "products-hits".into(),
        };
        let message = err.to_string();
        assert!(message.contains("5000"));
        assert!(message.contains("products-hits"));
    }
}
