//! Provider trait for LLM backends.
//!
//! [`Provider`] uses RPITIT (return-position `impl Trait` in traits) and is
//! intentionally NOT object-safe — callers are generic over `P: Provider`,
//! so there is no need to pay for dynamic dispatch at this boundary.

use crate::types::{ProviderRequest, ProviderResponse, StreamEvent};
use std::future::Future;
use thiserror::Error;

/// Errors from LLM providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The request itself was rejected (bad model, bad params).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Could not parse the provider's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider returned a non-2xx status; the raw body is kept for diagnostics.
    #[error("provider error (status {status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Operation was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited | ProviderError::RequestFailed(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Callback invoked once per content delta by [`Provider::complete_stream`].
pub trait StreamHandler: FnMut(StreamEvent) + Send {}
impl<F: FnMut(StreamEvent) + Send> StreamHandler for F {}

/// LLM provider interface.
///
/// Each concrete provider (Anthropic, OpenAI, Ollama) implements this trait.
/// Provider-native features (prompt caching, extended thinking) are handled
/// by the adapter using [`ProviderRequest::extra`].
///
/// `complete` blocks until the full response is available. `complete_stream`
/// instead calls `handler` once per content delta and returns once the
/// provider emits a terminal event or the request is cancelled.
///
/// Changing which model a provider targets (`set_model`) is not safe to
/// call concurrently with an in-flight `complete`/`complete_stream` call —
/// that's the caller's responsibility, not this trait's.
pub trait Provider: Send + Sync {
    /// Send a completion request to the provider and wait for the full response.
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;

    /// Send a streaming completion request, invoking `handler` once per delta.
    fn complete_stream(
        &self,
        request: ProviderRequest,
        handler: impl StreamHandler,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// The model this provider currently targets.
    fn model(&self) -> &str;

    /// Change the default model. Not safe to call with an in-flight request.
    fn set_model(&mut self, model: impl Into<String>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display() {
        assert_eq!(
            ProviderError::RequestFailed("timeout".into()).to_string(),
            "request failed: timeout"
        );
        assert_eq!(ProviderError::RateLimited.to_string(), "rate limited");
        assert_eq!(
            ProviderError::AuthFailed("bad key".into()).to_string(),
            "auth failed: bad key"
        );
        assert_eq!(
            ProviderError::InvalidResponse("bad json".into()).to_string(),
            "invalid response: bad json"
        );
        assert_eq!(
            ProviderError::Status { status: 503, body: "down".into() }.to_string(),
            "provider error (status 503): down"
        );
    }

    #[test]
    fn provider_error_retryable() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::RequestFailed("timeout".into()).is_retryable());
        assert!(!ProviderError::AuthFailed("bad key".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("x".into()).is_retryable());
        assert!(ProviderError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(ProviderError::Status { status: 500, body: String::new() }.is_retryable());
        assert!(!ProviderError::Status { status: 400, body: String::new() }.is_retryable());
    }
}
