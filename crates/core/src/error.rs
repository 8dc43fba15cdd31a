//! Failures reported by language model providers.
//!
//! Both pipelines degrade on these rather than surfacing them: evaluation
//! falls back to a proceed verdict, an introduction stream ends early.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The model answered, but not in the shape that was asked for.
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiError { .. } => "api_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::StreamInterrupted(_) => "stream_interrupted",
            Self::NotConfigured(_) => "not_configured",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}
