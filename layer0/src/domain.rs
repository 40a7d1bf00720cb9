//! The research domain model: sessions, workers, iterations, tool calls,
//! insights, and the cost monoid.
//!
//! These are plain records, not type hierarchies — polymorphism in this
//! engine lives at the port boundaries ([`crate::repository::SessionRepository`],
//! the LLM provider, the tool registry), not in the data model.

use crate::duration::DurationMs;
use crate::id::{SessionId, WorkerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Research strategy selected for a session.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Single-worker ReAct research.
    Fast,
    /// Planner + worker pool + synthesizer.
    Deep,
}

/// Lifecycle status of a [`Session`].
///
/// Transitions are one-way: `Pending -> Running -> {Complete, Failed}`;
/// `Complete -> Expanded` only via creation of a child session.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet dispatched to the orchestrator.
    Pending,
    /// Orchestrator has started planning or executing workers.
    Running,
    /// Research finished with at least one successful worker.
    Complete,
    /// Every worker failed, or the synthesizer failed.
    Failed,
    /// Complete and superseded by a child session (an expansion).
    Expanded,
}

impl SessionStatus {
    /// Whether this status is one of the terminal (non-`Running`/`Pending`) states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Failed | SessionStatus::Expanded)
    }
}

/// Lifecycle status of a [`Worker`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Not yet started.
    Pending,
    /// ReAct loop is in progress.
    Running,
    /// ReAct loop produced a final answer (or hit the iteration cap).
    Complete,
    /// The agent errored fatally or was cancelled.
    Failed,
}

/// Additive monoid of token counts and dollar costs.
///
/// `Add` is commutative and associative with [`CostBreakdown::ZERO`] as the
/// identity — summing per-worker costs and the synthesizer call yields the
/// total research cost regardless of grouping order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Input (prompt) tokens consumed.
    pub input_tokens: u64,
    /// Output (completion) tokens generated.
    pub output_tokens: u64,
    /// `input_tokens + output_tokens`.
    pub total_tokens: u64,
    /// Dollar cost of the input tokens.
    pub input_cost: Decimal,
    /// Dollar cost of the output tokens.
    pub output_cost: Decimal,
    /// `input_cost + output_cost`.
    pub total_cost: Decimal,
}

impl CostBreakdown {
    /// The additive identity.
    pub const ZERO: CostBreakdown = CostBreakdown {
        input_tokens: 0,
        output_tokens: 0,
        total_tokens: 0,
        input_cost: Decimal::ZERO,
        output_cost: Decimal::ZERO,
        total_cost: Decimal::ZERO,
    };

    /// Construct directly from token counts and dollar costs.
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        input_cost: Decimal,
        output_cost: Decimal,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }

    /// Mutate in place, adding `other`'s counts and costs.
    pub fn add(&mut self, other: &CostBreakdown) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
        self.input_cost += other.input_cost;
        self.output_cost += other.output_cost;
        self.total_cost += other.total_cost;
    }
}

impl std::ops::Add for CostBreakdown {
    type Output = CostBreakdown;
    fn add(mut self, rhs: CostBreakdown) -> CostBreakdown {
        self.add(&rhs);
        self
    }
}

impl std::iter::Sum for CostBreakdown {
    fn sum<I: Iterator<Item = CostBreakdown>>(iter: I) -> Self {
        iter.fold(CostBreakdown::ZERO, |acc, c| acc + c)
    }
}

/// One turn of the ReAct loop.
///
/// `number` is 1-based and strictly increasing within a worker's
/// `iterations` list, with no gaps.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iteration {
    /// 1-based sequence number within the owning worker.
    pub number: u32,
    /// Best-effort extraction of the model's reasoning for this turn.
    pub thought: String,
    /// Best-effort summary of the action taken (tool call or final answer).
    pub action: String,
    /// Best-effort summary of the result observed.
    pub result: String,
    /// When this iteration completed.
    pub timestamp: DateTime<Utc>,
}

/// Record of a single tool invocation within a worker's run.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool that was called.
    pub tool: String,
    /// Arguments passed to the tool.
    pub args: serde_json::Value,
    /// The tool's result (truncated/cleaned text), or the error message on failure.
    pub result: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// How long the call took.
    pub duration: DurationMs,
    /// The iteration number this call belongs to.
    pub iteration: u32,
    /// When the call completed.
    pub timestamp: DateTime<Utc>,
}

/// One synthesized finding extracted during research.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Short title for the finding.
    pub title: String,
    /// The finding itself.
    pub finding: String,
    /// Why the finding matters.
    pub implication: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Sources supporting the finding.
    pub sources: Vec<String>,
    /// The worker that produced this insight.
    pub worker_id: WorkerId,
}

/// An ordered, deduplicated set of source URLs.
///
/// Preserves first-seen insertion order — the thing a `BTreeSet<String>`
/// cannot do — while still rejecting duplicates in O(log n).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceList {
    order: Vec<String>,
    seen: BTreeSet<String>,
}

impl SourceList {
    /// An empty source list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a URL, ignoring it if already present.
    pub fn insert(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.seen.insert(url.clone()) {
            self.order.push(url);
        }
    }

    /// Iterate URLs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of distinct URLs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Borrow the first `n` URLs in insertion order.
    pub fn take(&self, n: usize) -> &[String] {
        &self.order[..self.order.len().min(n)]
    }
}

/// One sub-task execution: a single bounded ReAct run.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Unique id for this worker.
    pub id: WorkerId,
    /// 1-based position within the plan, used for display and `/rerun`.
    pub worker_num: u32,
    /// The objective assigned to this worker by the planner.
    pub objective: String,
    /// Names of tools this worker may call.
    pub tools_available: BTreeSet<String>,
    /// What the planner expects this worker to produce.
    pub expected_output: String,
    /// Append-only log of ReAct iterations.
    pub iterations: Vec<Iteration>,
    /// All tool calls made across the run.
    pub tool_calls: Vec<ToolCall>,
    /// The agent's final textual answer.
    pub final_output: String,
    /// A short summary of the final answer, for synthesis prompts.
    pub summary: String,
    /// Source URLs surfaced during the run.
    pub sources: Vec<String>,
    /// Current lifecycle status.
    pub status: WorkerStatus,
    /// Token/cost accounting for this worker alone.
    pub cost: CostBreakdown,
    /// When the worker started.
    pub started_at: DateTime<Utc>,
    /// When the worker reached a terminal status, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message, set iff `status == Failed`.
    pub error: Option<String>,
}

impl Worker {
    /// Create a freshly pending worker for the given plan slot.
    pub fn new(
        id: WorkerId,
        worker_num: u32,
        objective: impl Into<String>,
        expected_output: impl Into<String>,
        tools_available: BTreeSet<String>,
    ) -> Self {
        Self {
            id,
            worker_num,
            objective: objective.into(),
            tools_available,
            expected_output: expected_output.into(),
            iterations: Vec::new(),
            tool_calls: Vec::new(),
            final_output: String::new(),
            summary: String::new(),
            sources: Vec::new(),
            status: WorkerStatus::Pending,
            cost: CostBreakdown::ZERO,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// A point-in-time listing entry for [`crate::repository::SessionRepository::list`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// The original query.
    pub query: String,
    /// Current status.
    pub status: SessionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Total cost accumulated at time of listing.
    pub total_cost: Decimal,
}

/// The unit of user intent: one research query and everything it produced.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable id, unique for the life of the repository.
    pub id: SessionId,
    /// Parent session id, set when this session was created by an expansion.
    pub parent_id: Option<SessionId>,
    /// Version number; strictly increases along a `parent_id` chain.
    pub version: u32,
    /// The query, or expansion text, that produced this session.
    pub query: String,
    /// Research strategy used.
    pub mode: Mode,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Planner's complexity score in `[0, 1]`.
    pub complexity_score: f64,
    /// All workers dispatched for this session, index-aligned to the plan.
    pub workers: Vec<Worker>,
    /// The synthesizer's markdown report, once produced.
    pub report: String,
    /// Distinct source URLs encountered, in first-seen order.
    pub sources: SourceList,
    /// Extracted findings.
    pub insights: Vec<Insight>,
    /// Total cost across all workers plus synthesis.
    pub cost: CostBreakdown,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time; always `>= created_at`.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Start a brand-new root session in `Pending` status.
    pub fn new(id: SessionId, query: impl Into<String>, mode: Mode) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: None,
            version: 1,
            query: query.into(),
            mode,
            status: SessionStatus::Pending,
            complexity_score: 0.0,
            workers: Vec::new(),
            report: String::new(),
            sources: SourceList::new(),
            insights: Vec::new(),
            cost: CostBreakdown::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mint a child session: a new version on a deterministic child id,
    /// reset to `Pending`, with `parent_id` set to this session's id.
    ///
    /// Marks `self` as [`SessionStatus::Expanded`] — expansion supersedes
    /// the parent rather than mutating it, preserving the invariant that a
    /// completed session is otherwise immutable.
    pub fn new_version(&mut self, query: impl Into<String>) -> Session {
        let child_id = SessionId::new(format!("{}-v{}", self.id.as_str(), self.version + 1));
        let now = Utc::now();
        self.status = SessionStatus::Expanded;
        self.updated_at = now;
        Session {
            id: child_id,
            parent_id: Some(self.id.clone()),
            version: self.version + 1,
            query: query.into(),
            mode: self.mode,
            status: SessionStatus::Pending,
            complexity_score: 0.0,
            workers: Vec::new(),
            report: String::new(),
            sources: SourceList::new(),
            insights: Vec::new(),
            cost: CostBreakdown::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total input+output tokens summed over workers and the session's own cost ledger.
    pub fn recompute_cost(&mut self) {
        self.cost = self.workers.iter().map(|w| w.cost).sum();
    }

    /// A lightweight listing summary for [`SessionSummary`].
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            query: self.query.clone(),
            status: self.status,
            created_at: self.created_at,
            total_cost: self.cost.total_cost,
        }
    }
}
