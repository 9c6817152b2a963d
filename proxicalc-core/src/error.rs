//! Unified error handling for the proximity indexing pipeline

use thiserror::Error;

pub type IndexerResult<T> = Result<T, IndexerError>;

/// Main error type for the proxicalc workspace.
///
/// Every fatal condition of the batch run maps to one of these variants;
/// per-record bulk failures are not errors, they surface through
/// [`crate::RunCounters`] and logs instead.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search backend error: {0}")]
    Backend(String),

    #[error("Backend error response ({status}): {reason}")]
    Response { status: u16, reason: String },

    #[error("Bulk destination error: {0}")]
    Bulk(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexerError {
    /// Whether the condition may clear on its own if the request is re-sent.
    ///
    /// Only used beneath the HTTP client's bounded retry; anything that
    /// escapes the client is final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IndexerError::Response {
                status: 429 | 502 | 503 | 504,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        for status in [429, 502, 503, 504] {
            assert!(IndexerError::Response {
                status,
                reason: "busy".into()
            }
            .is_transient());
        }
        assert!(!IndexerError::Response {
            status: 400,
            reason: "mapping".into()
        }
        .is_transient());
        assert!(!IndexerError::Backend("connection refused".into()).is_transient());
    }
}
