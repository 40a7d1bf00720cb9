//! The cross-cutting event bus: a typed, closed-set pub/sub channel that
//! every component publishes to and the primary adapter subscribes from.

use crate::domain::{CostBreakdown, Insight, Iteration, SessionStatus, ToolCall, WorkerStatus};
use crate::id::{SessionId, WorkerId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of event kinds the bus will ever carry.
///
/// Adding a variant here is a breaking change for subscribers filtering by
/// kind, which is the point — the set is meant to be exhaustively matched.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A session moved to [`SessionStatus::Running`].
    SessionStarted,
    /// A session reached a terminal status.
    SessionFinished,
    /// A worker began its ReAct run.
    WorkerStarted,
    /// A worker finished successfully.
    WorkerComplete,
    /// A worker failed.
    WorkerFailed,
    /// One ReAct iteration completed.
    IterationComplete,
    /// A tool call completed (successfully or not).
    ToolCallComplete,
    /// The synthesizer produced an insight.
    InsightFound,
    /// The diffusion supervisor finished a refinement pass.
    RefinementComplete,
}

/// Payload carried by an [`Event`], one variant per [`EventType`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventData {
    /// See [`EventType::SessionStarted`].
    SessionStarted {
        /// The session that started.
        session_id: SessionId,
    },
    /// See [`EventType::SessionFinished`].
    SessionFinished {
        /// The session that finished.
        session_id: SessionId,
        /// Its terminal status.
        status: SessionStatus,
        /// Total accumulated cost.
        cost: CostBreakdown,
    },
    /// See [`EventType::WorkerStarted`].
    WorkerStarted {
        /// Owning session.
        session_id: SessionId,
        /// The worker that started.
        worker_id: WorkerId,
        /// Its assigned objective.
        objective: String,
    },
    /// See [`EventType::WorkerComplete`].
    WorkerComplete {
        /// Owning session.
        session_id: SessionId,
        /// The worker that completed.
        worker_id: WorkerId,
        /// Its cost for this run.
        cost: CostBreakdown,
    },
    /// See [`EventType::WorkerFailed`].
    WorkerFailed {
        /// Owning session.
        session_id: SessionId,
        /// The worker that failed.
        worker_id: WorkerId,
        /// Error message.
        error: String,
    },
    /// See [`EventType::IterationComplete`].
    IterationComplete {
        /// Owning session.
        session_id: SessionId,
        /// Owning worker.
        worker_id: WorkerId,
        /// The iteration record.
        iteration: Iteration,
    },
    /// See [`EventType::ToolCallComplete`].
    ToolCallComplete {
        /// Owning session.
        session_id: SessionId,
        /// Owning worker.
        worker_id: WorkerId,
        /// The tool call record.
        call: ToolCall,
    },
    /// See [`EventType::InsightFound`].
    InsightFound {
        /// Owning session.
        session_id: SessionId,
        /// The finding.
        insight: Insight,
    },
    /// See [`EventType::RefinementComplete`].
    RefinementComplete {
        /// Owning session.
        session_id: SessionId,
        /// Refinement pass number, 1-based.
        pass: u32,
        /// Whether the draft converged and the loop should stop.
        converged: bool,
    },
}

impl EventData {
    /// The [`EventType`] this payload corresponds to.
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::SessionStarted { .. } => EventType::SessionStarted,
            EventData::SessionFinished { .. } => EventType::SessionFinished,
            EventData::WorkerStarted { .. } => EventType::WorkerStarted,
            EventData::WorkerComplete { .. } => EventType::WorkerComplete,
            EventData::WorkerFailed { .. } => EventType::WorkerFailed,
            EventData::IterationComplete { .. } => EventType::IterationComplete,
            EventData::ToolCallComplete { .. } => EventType::ToolCallComplete,
            EventData::InsightFound { .. } => EventType::InsightFound,
            EventData::RefinementComplete { .. } => EventType::RefinementComplete,
        }
    }
}

/// A single message on the bus: a typed payload with a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// The payload.
    pub data: EventData,
}

impl Event {
    /// Wrap a payload, stamping it with the current time.
    pub fn new(data: EventData) -> Self {
        Self { timestamp: Utc::now(), data }
    }

    /// The [`EventType`] of this event, for filtering.
    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }
}

/// A per-subscriber handle returned by [`EventBus::subscribe`].
///
/// Implementations back this with a bounded channel receiver; `recv`
/// returns `None` once the bus (or this subscription) is closed and
/// drained.
#[async_trait]
pub trait EventSubscription: Send {
    /// Receive the next matching event, or `None` if the subscription is
    /// closed and has no more buffered events.
    async fn recv(&mut self) -> Option<Event>;
}

/// Cross-cutting publish/subscribe bus.
///
/// `subscribe` is filtered by [`EventType`]: a subscriber only receives
/// events whose type is in the set it passed. `publish` never blocks the
/// publisher — a slow or inattentive subscriber has events dropped for it
/// rather than stalling the producer. `close` is idempotent and safe to
/// call from any thread; it must not panic if called more than once or
/// concurrently with `publish`.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Register a new subscriber interested in `types`. An empty set means
    /// "every event type".
    async fn subscribe(&self, types: &[EventType]) -> Box<dyn EventSubscription>;

    /// Publish an event to every current subscriber whose filter matches.
    /// Subscribers with a full buffer silently drop the event rather than
    /// block the publisher.
    fn publish(&self, event: Event);

    /// Stop accepting new subscribers and close every existing
    /// subscription's channel. Idempotent.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn event_type_matches_data_variant() {
        let ev = Event::new(EventData::WorkerStarted {
            session_id: SessionId::new("s1"),
            worker_id: WorkerId::new("w1"),
            objective: "find docs".into(),
        });
        assert_eq!(ev.event_type(), EventType::WorkerStarted);
    }

    #[test]
    fn event_types_are_orderable_for_closed_set_filters() {
        let mut set = BTreeSet::new();
        set.insert(EventType::WorkerStarted);
        set.insert(EventType::WorkerFailed);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn worker_status_and_event_are_independent_enums() {
        // Sanity: EventData variants don't need to mirror WorkerStatus 1:1.
        let _ = WorkerStatus::Running;
    }
}
