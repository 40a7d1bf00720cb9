//! Environment-variable configuration loading.
//!
//! `research-core` deliberately accepts an already-resolved [`EngineConfig`]
//! rather than reading the environment itself; this module is where that
//! resolution actually happens, for the REPL binary specifically.

use std::path::PathBuf;
use std::time::Duration;

use research_core::EngineConfig;

use crate::error::CliError;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_ITERATIONS: u32 = 20;
const DEFAULT_DIFFUSION_MAX_ITERATIONS: u32 = 15;
const DEFAULT_SUB_RESEARCHER_MAX_ITERATIONS: u32 = 5;
const DEFAULT_MAX_TOKENS_PER_AGENT: u64 = 50_000;
const DEFAULT_MAX_WORKERS: usize = 5;
const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_STATE_DIR: &str = ".deepagent/sessions";
const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Resolved startup configuration, read once from the process environment.
pub struct CliConfig {
    /// Active LLM model id.
    pub model: String,
    /// Anthropic API key.
    pub llm_api_key: String,
    /// Web search API key, if search tools are enabled.
    pub search_api_key: Option<String>,
    /// Web search endpoint, used only when `search_api_key` is set.
    pub search_endpoint: String,
    /// Engine tunables handed to [`research_core::ResearchService`].
    pub engine: EngineConfig,
    /// Per-worker wall-clock budget; workers still running past this are
    /// abandoned by the REPL (the underlying task is not forcibly killed).
    pub worker_timeout: Duration,
    /// Per-LLM-request timeout, applied to the Anthropic client.
    pub request_timeout: Duration,
    /// Directory session state is persisted under.
    pub state_dir: PathBuf,
    /// Directory for vaulted artifacts (reports, exports), if configured.
    pub vault_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Only `DEEPAGENT_LLM_API_KEY` is required; every other variable has a
    /// documented default.
    pub fn from_env() -> Result<Self, CliError> {
        let llm_api_key = require_env("DEEPAGENT_LLM_API_KEY")?;
        let search_api_key = optional_env("DEEPAGENT_SEARCH_API_KEY");
        let search_endpoint = std::env::var("DEEPAGENT_SEARCH_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_SEARCH_ENDPOINT.to_string());
        let model = std::env::var("DEEPAGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_iterations = parse_env("DEEPAGENT_MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?;
        let max_tokens_per_agent =
            parse_env("DEEPAGENT_MAX_TOKENS_PER_AGENT", DEFAULT_MAX_TOKENS_PER_AGENT)?;
        let max_workers = parse_env("DEEPAGENT_MAX_WORKERS", DEFAULT_MAX_WORKERS)?;
        let diffusion_max_iterations =
            parse_env("DEEPAGENT_DIFFUSION_MAX_ITERATIONS", DEFAULT_DIFFUSION_MAX_ITERATIONS)?;
        let sub_researcher_max_iterations = parse_env(
            "DEEPAGENT_SUB_RESEARCHER_MAX_ITERATIONS",
            DEFAULT_SUB_RESEARCHER_MAX_ITERATIONS,
        )?;
        let max_parallel_sub_research = parse_env("DEEPAGENT_MAX_PARALLEL_SUB_RESEARCH", 3usize)?;

        let worker_timeout_secs =
            parse_env("DEEPAGENT_WORKER_TIMEOUT_SECS", DEFAULT_WORKER_TIMEOUT_SECS)?;
        let request_timeout_secs =
            parse_env("DEEPAGENT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let state_dir = std::env::var("DEEPAGENT_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));
        let vault_dir = optional_env("DEEPAGENT_VAULT_DIR").map(PathBuf::from);

        let mut engine = EngineConfig::default();
        engine.fast_agent.max_iterations = max_iterations;
        engine.fast_agent.max_tokens_per_agent = max_tokens_per_agent;
        engine.worker_agent.max_iterations = max_iterations;
        engine.worker_agent.max_tokens_per_agent = max_tokens_per_agent;
        engine.max_workers = max_workers;
        engine.diffusion.max_iterations = diffusion_max_iterations;
        engine.diffusion.sub_researcher_max_iterations = sub_researcher_max_iterations;
        engine.diffusion.max_parallel_sub_research = max_parallel_sub_research;

        Ok(Self {
            model,
            llm_api_key,
            search_api_key,
            search_endpoint,
            engine,
            worker_timeout: Duration::from_secs(worker_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            state_dir,
            vault_dir,
        })
    }
}

fn require_env(name: &str) -> Result<String, CliError> {
    std::env::var(name).map_err(|_| CliError::Config(format!("missing required env var {name}")))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, CliError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| CliError::Config(format!("invalid value for {name}: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for name in [
            "DEEPAGENT_LLM_API_KEY",
            "DEEPAGENT_SEARCH_API_KEY",
            "DEEPAGENT_MODEL",
            "DEEPAGENT_MAX_ITERATIONS",
            "DEEPAGENT_MAX_TOKENS_PER_AGENT",
            "DEEPAGENT_MAX_WORKERS",
            "DEEPAGENT_DIFFUSION_MAX_ITERATIONS",
            "DEEPAGENT_SUB_RESEARCHER_MAX_ITERATIONS",
            "DEEPAGENT_MAX_PARALLEL_SUB_RESEARCH",
            "DEEPAGENT_WORKER_TIMEOUT_SECS",
            "DEEPAGENT_REQUEST_TIMEOUT_SECS",
            "DEEPAGENT_STATE_DIR",
            "DEEPAGENT_VAULT_DIR",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = CliConfig::from_env().unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn defaults_apply_when_only_api_key_is_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("DEEPAGENT_LLM_API_KEY", "sk-test");
        let config = CliConfig::from_env().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.engine.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(config.engine.fast_agent.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
        assert!(config.vault_dir.is_none());
        clear_all();
    }

    #[test]
    fn overrides_are_honored() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("DEEPAGENT_LLM_API_KEY", "sk-test");
        std::env::set_var("DEEPAGENT_MODEL", "claude-opus-4-5");
        std::env::set_var("DEEPAGENT_MAX_WORKERS", "9");
        let config = CliConfig::from_env().unwrap();
        assert_eq!(config.model, "claude-opus-4-5");
        assert_eq!(config.engine.max_workers, 9);
        clear_all();
    }

    #[test]
    fn malformed_numeric_override_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("DEEPAGENT_LLM_API_KEY", "sk-test");
        std::env::set_var("DEEPAGENT_MAX_WORKERS", "not-a-number");
        let err = CliConfig::from_env().unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        clear_all();
    }
}
