//! Error types for the decision engine

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid caller-supplied input (non-positive balance/leverage/price,
    /// malformed timeframe, out-of-range count, unordered series)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An upstream collaborator (data provider, sentiment source) failed,
    /// timed out or was rate-limited
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Sentiment source returned content without the expected structured fields
    #[error("Unparsable sentiment response: {0}")]
    UnparsableSentiment(String),

    /// An outbound collaborator call exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}, retry after {retry_after_seconds:?} seconds")]
    RateLimit {
        message: String,
        retry_after_seconds: Option<u64>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the synthesizer recovers from this error with a degraded
    /// recommendation instead of surfacing it to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::UpstreamUnavailable(_)
                | EngineError::UnparsableSentiment(_)
                | EngineError::Timeout(_)
                | EngineError::HttpRequest(_)
                | EngineError::InvalidResponse(_)
                | EngineError::RateLimit { .. }
        )
    }
}
