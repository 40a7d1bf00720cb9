//! # layer0 — core domain model and ports for the deep-research agent engine
//!
//! This crate has no knowledge of any concrete LLM provider, tool, or
//! storage backend. It defines the shapes that cross those boundaries and
//! the traits that let the rest of the workspace depend on each other only
//! through this crate.
//!
//! | Concern | Module | What it does |
//! |---------|--------|--------------|
//! | Domain model | [`domain`] | `Session`, `Worker`, `Iteration`, `ToolCall`, `Insight`, `CostBreakdown` |
//! | Identity | [`id`] | Typed `SessionId`/`WorkerId` wrappers |
//! | Errors | [`error`] | Per-port error enums |
//! | Events | [`event`] | The cross-cutting `EventBus` pub/sub port |
//! | Persistence | [`repository`] | The `SessionRepository` port |
//! | Cancellation | [`cancel`] | The cooperative `CancelToken` flag |
//!
//! ## Design Principle
//!
//! Ports are operation-defined: [`event::EventBus::publish`] means "make
//! this event visible to current subscribers", not "write to a channel" —
//! an in-process `tokio::sync::broadcast` bus and a future Redis-backed one
//! both satisfy the same trait.
//!
//! ## Dependency Notes
//!
//! This crate depends on `serde_json::Value` for tool-call argument
//! payloads. JSON is the interchange format at the tool boundary, so
//! `serde_json::Value` is used directly rather than a generic `T: Serialize`,
//! which would complicate trait object safety without practical benefit.

#![deny(missing_docs)]

pub mod cancel;
pub mod domain;
pub mod duration;
pub mod error;
pub mod event;
pub mod id;
pub mod repository;

// Re-exports for convenience
pub use cancel::CancelToken;
pub use domain::{
    CostBreakdown, Insight, Iteration, Mode, Session, SessionStatus, SessionSummary, SourceList,
    ToolCall, Worker, WorkerStatus,
};
pub use duration::DurationMs;
pub use error::{AgentError, OrchError, RepoError};
pub use event::{Event, EventBus, EventData, EventSubscription, EventType};
pub use id::{SessionId, WorkerId};
pub use repository::SessionRepository;
