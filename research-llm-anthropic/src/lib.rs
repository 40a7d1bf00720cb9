#![deny(missing_docs)]
//! Anthropic Messages API provider adapter for `research-llm`.
//!
//! Implements [`research_llm::Provider`] against Anthropic's `/v1/messages`
//! endpoint, including streaming via server-sent events.

mod client;
mod error;
mod mapping;
mod streaming;

pub use client::Anthropic;
pub use mapping::from_api_response;
