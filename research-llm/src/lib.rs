#![deny(missing_docs)]
//! LLM provider port, wire types, token counting, and cost model.
//!
//! This crate has no concrete provider implementation — see
//! `research-llm-anthropic` for the Anthropic adapter. It defines:
//! - [`Provider`] — the provider interface (not object-safe, uses RPITIT)
//! - [`TokenCounter`] — deterministic token estimation
//! - [`CostModel`] — per-model dollar pricing

pub mod cost;
pub mod provider;
pub mod token;
pub mod types;

// Re-exports
pub use cost::CostModel;
pub use provider::{Provider, ProviderError, StreamHandler};
pub use token::TokenCounter;
pub use types::*;
