//! Anthropic API client struct and builder.

use research_llm::{Provider, ProviderError, ProviderRequest, ProviderResponse, StreamHandler};

use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::{from_api_response, to_api_request};
use crate::streaming::drive_sse;

/// Default model used when none is specified on the request.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default Anthropic API base URL.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
///
/// Implements [`Provider`] for use anywhere a provider is accepted.
/// `Clone` is cheap: the underlying [`reqwest::Client`] is reference-counted,
/// so cloning is the usual way to hand the same client to several
/// components (planner, worker pool, synthesizer) that each need an owned
/// provider value.
///
/// # Example
///
/// ```no_run
/// use research_llm_anthropic::Anthropic;
///
/// let client = Anthropic::new("sk-ant-...")
///     .model("claude-opus-4-5")
///     .base_url("https://api.anthropic.com");
/// ```
#[derive(Clone)]
pub struct Anthropic {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl Anthropic {
    /// Create a new client with the given API key and sensible defaults.
    ///
    /// Default model: `claude-sonnet-4-20250514`.
    /// Default base URL: `https://api.anthropic.com`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the default model.
    ///
    /// This is used when [`ProviderRequest::model`] is `None`.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the per-request timeout (default: the `reqwest` client default).
    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with static configuration");
        self
    }

    /// Build the messages endpoint URL.
    pub(crate) fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

impl Provider for Anthropic {
    /// Send a completion request to the Anthropic Messages API.
    ///
    /// Maps the [`ProviderRequest`] to Anthropic's JSON format, sends it with
    /// the required headers, and maps the response back to [`ProviderResponse`].
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut body = to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(false);
        let url = self.messages_url();

        tracing::debug!(url = %url, model = %body["model"], "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let response_text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(map_http_status(status, &response_text));
        }

        let json: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        from_api_response(&json)
    }

    /// Send a streaming completion request, calling `handler` once per
    /// [`StreamEvent`][research_llm::StreamEvent] as the model generates content.
    async fn complete_stream(
        &self,
        request: ProviderRequest,
        handler: impl StreamHandler,
    ) -> Result<(), ProviderError> {
        let mut body = to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(true);
        let url = self.messages_url();

        tracing::debug!(url = %url, model = %body["model"], "sending streaming completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            return Err(map_http_status(status, &body_text));
        }

        drive_sse(response, handler).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }
}
