//! Tunables for [`crate::ResearchService`].
//!
//! Parsing these from the environment is the primary adapter's job, not
//! this crate's — `EngineConfig` only holds already-resolved values.

use research_agent::AgentConfig;
use research_orch::DiffusionConfig;

/// Base system prompt for a `/fast` single-worker run.
const FAST_SYSTEM_PROMPT: &str = "You are a research assistant. Investigate the \
objective thoroughly using the available tools, then give a clear, well-sourced \
final answer.";

/// Base system prompt for a deep-research worker (one planner-assigned task).
const WORKER_SYSTEM_PROMPT: &str = "You are a research worker. Investigate your \
assigned objective thoroughly using the available tools, then report a focused \
final answer covering exactly that objective.";

/// Default concurrent worker cap for deep research.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Resolved configuration for a [`crate::ResearchService`].
///
/// Mirrors the environment options named in the external interface
/// contract (`model`, `max_iterations`, `max_tokens_per_agent`,
/// `max_workers`, …) without parsing them itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Agent config for `/fast` single-worker runs.
    pub fast_agent: AgentConfig,
    /// Agent config used by every deep-research worker.
    pub worker_agent: AgentConfig,
    /// Maximum concurrently running workers in deep mode.
    pub max_workers: usize,
    /// Diffusion supervisor loop tunables.
    pub diffusion: DiffusionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_agent: AgentConfig { system_prompt: FAST_SYSTEM_PROMPT.to_string(), ..Default::default() },
            worker_agent: AgentConfig { system_prompt: WORKER_SYSTEM_PROMPT.to_string(), ..Default::default() },
            max_workers: DEFAULT_MAX_WORKERS,
            diffusion: DiffusionConfig::default(),
        }
    }
}
