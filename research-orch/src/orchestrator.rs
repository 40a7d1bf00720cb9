//! Ties the planner, worker pool, and synthesizer into the "deep" research
//! flow: score complexity, decompose into tasks, run them concurrently,
//! synthesize a report.
//!
//! `P: Provider + Clone` lets one authenticated client (e.g.
//! [`research_llm_anthropic::Anthropic`], whose `Clone` is a cheap
//! `reqwest::Client` handle share) back all three stages without each
//! needing its own credentials.

use std::sync::Arc;

use layer0::{
    CancelToken, CostBreakdown, EventBus, OrchError, SessionId, Worker, WorkerId, WorkerStatus,
};
use research_agent::{AgentConfig, ReactAgent};
use research_llm::cost::CostModel;
use research_llm::Provider;
use research_tool::ToolRegistry;

use crate::planner::{worker_count_for_score, Planner};
use crate::pool::WorkerPool;
use crate::synthesizer::Synthesizer;

/// The full result of one deep-research run.
#[derive(Debug, Clone)]
pub struct DeepResearchOutcome {
    /// The complexity score the planner assigned the query.
    pub complexity_score: f64,
    /// One worker record per planned task, index-aligned to the plan.
    pub workers: Vec<Worker>,
    /// The synthesizer's markdown report.
    pub report: String,
    /// Token/dollar cost summed across planning, every worker, and synthesis.
    pub cost: CostBreakdown,
}

/// Facade over [`Planner`], [`WorkerPool`], and [`Synthesizer`] for the
/// plan→pool→synthesize flow.
pub struct Orchestrator<P: Provider> {
    planner: Planner<P>,
    pool: WorkerPool<P>,
    synthesizer: Synthesizer<P>,
}

impl<P: Provider + Clone + Send + Sync + 'static> Orchestrator<P> {
    /// Build an orchestrator around one provider, shared (via `clone`)
    /// across the planner, every pooled worker's agent, and the synthesizer.
    pub fn new(
        provider: P,
        tools: Arc<ToolRegistry>,
        agent_config: AgentConfig,
        max_workers: usize,
        cost_model: CostModel,
    ) -> Self {
        let planner = Planner::new(provider.clone()).with_cost_model(cost_model.clone());
        let agent = Arc::new(
            ReactAgent::new(provider.clone(), agent_config).with_cost_model(cost_model.clone()),
        );
        let pool = WorkerPool::new(agent, tools, max_workers);
        let synthesizer = Synthesizer::new(provider).with_cost_model(cost_model);
        Self { planner, pool, synthesizer }
    }

    /// Run the whole deep-research flow for `query`.
    ///
    /// Fails the whole run only when every worker fails or synthesis itself
    /// fails; an individual worker's failure is captured in its own
    /// [`Worker`] record and never aborts the run.
    pub async fn run(
        &self,
        session_id: &SessionId,
        query: &str,
        bus: Arc<dyn EventBus>,
        cancel: &CancelToken,
    ) -> Result<DeepResearchOutcome, OrchError> {
        let mut cost = CostBreakdown::ZERO;

        let (score, complexity_cost) = self
            .planner
            .analyze_complexity(query)
            .await
            .map_err(|e| OrchError::Other(Box::new(e)))?;
        cost.add(&complexity_cost);

        let num_workers = worker_count_for_score(score);
        let (tasks, plan_cost) = self
            .planner
            .create_plan(query, num_workers)
            .await
            .map_err(|e| OrchError::Other(Box::new(e)))?;
        cost.add(&plan_cost);

        let pending: Vec<Worker> = tasks
            .into_iter()
            .enumerate()
            .map(|(i, task)| {
                let worker_num = (i + 1) as u32;
                Worker::new(
                    WorkerId::new(format!("task-{worker_num}")),
                    worker_num,
                    task.objective,
                    task.expected_output,
                    Default::default(),
                )
            })
            .collect();

        let workers = self.pool.execute(session_id, bus, pending, cancel).await;
        for worker in &workers {
            cost.add(&worker.cost);
        }

        // An empty plan (e.g. an empty query) degrades the same way a fully
        // failed pool does: there is nothing to synthesize from.
        if workers.is_empty() || workers.iter().all(|w| w.status == WorkerStatus::Failed) {
            return Err(OrchError::AllWorkersFailed);
        }

        let (report, synthesis_cost) = self
            .synthesizer
            .synthesize(query, &workers, None)
            .await
            .map_err(|e| OrchError::SynthesisFailed(e.to_string()))?;
        cost.add(&synthesis_cost);

        Ok(DeepResearchOutcome { complexity_score: score, workers, report, cost })
    }
}
