//! Built-in `search` and `fetch` tools.
//!
//! Both tools are thin adapters over a provider port — [`SearchProvider`]
//! and [`FetchProvider`] — so the HTTP/API details live outside this crate
//! and tests can supply a fake provider.

use crate::{ToolDyn, ToolError};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Maximum characters returned by [`FetchTool`] before truncation.
pub const FETCH_MAX_CHARS: usize = 10_000;

/// Per-request timeout for both built-in tools.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header sent by both built-in tools.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; deepagent-research/0.1)";

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short description or snippet.
    pub description: String,
}

/// Port for the backend that powers [`SearchTool`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search, returning up to `count` ranked results.
    async fn search(&self, query: &str, count: u32) -> Result<Vec<SearchResult>, ToolError>;
}

/// Port for the backend that powers [`FetchTool`].
#[async_trait]
pub trait FetchProvider: Send + Sync {
    /// Fetch `url` and return its raw response body as text.
    ///
    /// Implementations must fail on a non-2xx status and honor
    /// [`REQUEST_TIMEOUT`] and [`USER_AGENT`].
    async fn fetch(&self, url: &str) -> Result<String, ToolError>;
}

/// Truncate `text` to at most `max_chars` characters, appending an
/// explicit trailing marker when truncation occurred.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}... [truncated, {total} chars total]")
}

/// Strip `<script>`/`<style>` element contents and collapse runs of
/// whitespace down to single spaces.
///
/// This is a best-effort plain-text cleaner, not a full HTML parser — the
/// fetch tool only needs readable text, not a faithful DOM.
pub fn clean_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < html.len() {
        if lower[i..].starts_with("<script") || lower[i..].starts_with("<style") {
            let tag_name = if lower[i..].starts_with("<script") { "script" } else { "style" };
            let close = format!("</{tag_name}>");
            match lower[i..].find(&close) {
                Some(end) => {
                    i += end + close.len();
                    continue;
                }
                None => break,
            }
        }
        if html.as_bytes()[i] == b'<' {
            match html[i..].find('>') {
                Some(end) => {
                    i += end + 1;
                    continue;
                }
                None => break,
            }
        }
        let next_lt = html[i..].find('<').map(|p| i + p).unwrap_or(html.len());
        out.push_str(&html[i..next_lt]);
        i = next_lt;
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The `search` tool: ranked web search results as numbered human-readable text.
pub struct SearchTool<P> {
    provider: P,
}

impl<P: SearchProvider> SearchTool<P> {
    /// Wrap a [`SearchProvider`] as a [`ToolDyn`].
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: SearchProvider + 'static> ToolDyn for SearchTool<P> {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web and return a ranked list of title/url/description results."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "count": {"type": "integer", "description": "Number of results to return", "default": 10},
            },
            "required": ["query"],
        })
    }

    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let query = input
                .get("query")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("query is required".into()))?;
            if query.trim().is_empty() {
                return Err(ToolError::InvalidInput("query must not be empty".into()));
            }
            let count = input.get("count").and_then(|v| v.as_u64()).unwrap_or(10) as u32;

            tracing::debug!(query, count, "running search");
            let results = self.provider.search(query, count).await?;

            if results.is_empty() {
                return Ok("No results found.".to_string());
            }
            let body = results
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{}. {}\n{}\n{}", i + 1, r.title, r.url, r.description))
                .collect::<Vec<_>>()
                .join("\n\n");
            Ok(body)
        })
    }
}

/// The `fetch` tool: cleaned plain-text body of a URL.
pub struct FetchTool<P> {
    provider: P,
}

impl<P: FetchProvider> FetchTool<P> {
    /// Wrap a [`FetchProvider`] as a [`ToolDyn`].
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: FetchProvider + 'static> ToolDyn for FetchTool<P> {
    fn name(&self) -> &str {
        "fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL and return its cleaned plain-text body."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "URL to fetch"},
            },
            "required": ["url"],
        })
    }

    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let url = input
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("url is required".into()))?;

            tracing::debug!(url, "fetching");
            let body = self.provider.fetch(url).await?;
            let cleaned = clean_html(&body);
            Ok(truncate_with_marker(&cleaned, FETCH_MAX_CHARS))
        })
    }
}

/// A [`FetchProvider`]/[`SearchProvider`] pair backed by a real HTTP client.
///
/// Grounded in the corpus's convention of a thin `reqwest::Client` wrapper
/// with a fixed timeout and User-Agent.
#[derive(Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    search_endpoint: String,
    search_api_key: String,
}

impl HttpProvider {
    /// Build a provider against a search API reachable at `search_endpoint`,
    /// authenticated with `search_api_key`.
    pub fn new(search_endpoint: impl Into<String>, search_api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client builds with static configuration");
        Self {
            client,
            search_endpoint: search_endpoint.into(),
            search_api_key: search_api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for HttpProvider {
    async fn search(&self, query: &str, count: u32) -> Result<Vec<SearchResult>, ToolError> {
        let response = self
            .client
            .get(&self.search_endpoint)
            .bearer_auth(&self.search_api_key)
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "search provider returned status {status}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("invalid search response: {e}")))?;

        let mut results: Vec<SearchResult> = json
            .get("results")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| {
                Some(SearchResult {
                    title: r.get("title")?.as_str()?.to_string(),
                    url: r.get("url")?.as_str()?.to_string(),
                    description: r
                        .get("description")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                })
            })
            .collect();

        // The backend may return more than requested; the contract bounds
        // the count regardless of what the provider sends.
        results.truncate(count as usize);

        Ok(results)
    }
}

#[async_trait]
impl FetchProvider for HttpProvider {
    async fn fetch(&self, url: &str) -> Result<String, ToolError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("fetch request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!("fetch returned status {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("invalid fetch body: {e}")))
    }
}
