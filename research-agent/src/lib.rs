#![deny(missing_docs)]
//! The ReAct agent and worker runner for the deep-research agent engine.
//!
//! [`ReactAgent`] drives a bounded Reason-Act-Observe loop against any
//! [`research_llm::Provider`], using a text-tag protocol
//! (`<tool name="...">{json}</tool>`, `<answer>...</answer>`) rather than a
//! provider's native structured tool-calling. [`run_worker`] wraps one
//! agent run with event-bus publication, turning agent failures into a
//! degraded [`layer0::Worker`] record rather than propagating them.

mod agent;
mod tags;
mod worker;

pub use agent::{
    AgentConfig, AgentOutcome, ReactAgent, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS_PER_AGENT,
    DEFAULT_MAX_TOKENS_PER_CALL, ITERATION_LIMIT_MESSAGE,
};
pub use tags::{extract_urls, parse_answer, parse_tool_calls, ParsedToolCall};
pub use worker::run_worker;
