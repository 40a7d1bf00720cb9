//! [`ResearchService`]: the primary adapter's single entry point into the
//! agent engine, covering `/fast`, `/deep`, `/expand`, `/rerun`, and
//! `/recompile`.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use layer0::{
    CancelToken, Event, EventBus, EventData, Mode, OrchError, Session, SessionId, SessionStatus,
    Worker, WorkerId, WorkerStatus,
};
use research_agent::{run_worker, ReactAgent};
use research_llm::cost::CostModel;
use research_llm::{Provider, ProviderError};
use research_orch::{DiffusionSupervisor, Orchestrator, Synthesizer};
use research_tool::ToolRegistry;

use crate::config::EngineConfig;
use crate::continuation::build_continuation_context;
use crate::id_gen::SessionIdGenerator;

/// What a `/fast` or `/deep` research objective produced, before it is
/// wrapped into a [`Session`] — kept mostly for symmetry with the
/// orchestrator's own outcome type; callers get back the [`Session`] directly.
const SINGLE_WORKER_EXPECTED_OUTPUT: &str = "a thorough, well-sourced answer";

/// Ties the ReAct agent, the orchestrator, and the diffusion supervisor
/// together behind the semantic operations the REPL (or any other primary
/// adapter) drives: fast research, deep research, expansion, worker rerun,
/// and synthesis recompilation.
pub struct ResearchService<P: Provider + Clone + Send + Sync + 'static> {
    provider: P,
    tools: Arc<ToolRegistry>,
    bus: Arc<dyn EventBus>,
    cost_model: CostModel,
    config: EngineConfig,
    fast_agent: Arc<ReactAgent<P>>,
    orchestrator: Orchestrator<P>,
    ids: SessionIdGenerator,
}

impl<P: Provider + Clone + Send + Sync + 'static> ResearchService<P> {
    /// Build a service around `provider`, sharing `tools` and `bus` with
    /// every component it drives.
    pub fn new(provider: P, tools: Arc<ToolRegistry>, bus: Arc<dyn EventBus>, config: EngineConfig) -> Self {
        let cost_model = CostModel::with_defaults();
        let (fast_agent, orchestrator) = Self::build_components(&provider, &tools, &config, &cost_model);
        Self { provider, tools, bus, cost_model, config, fast_agent, orchestrator, ids: SessionIdGenerator::new() }
    }

    fn build_components(
        provider: &P,
        tools: &Arc<ToolRegistry>,
        config: &EngineConfig,
        cost_model: &CostModel,
    ) -> (Arc<ReactAgent<P>>, Orchestrator<P>) {
        let fast_agent = Arc::new(
            ReactAgent::new(provider.clone(), config.fast_agent.clone())
                .with_cost_model(cost_model.clone()),
        );
        let orchestrator = Orchestrator::new(
            provider.clone(),
            Arc::clone(tools),
            config.worker_agent.clone(),
            config.max_workers,
            cost_model.clone(),
        );
        (fast_agent, orchestrator)
    }

    /// The model the service currently targets.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Change the active model. Rebuilds every internal component so the
    /// new identity is actually used; per the provider contract, the
    /// caller must not have a research run in flight when calling this.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.provider.set_model(model);
        let (fast_agent, orchestrator) =
            Self::build_components(&self.provider, &self.tools, &self.config, &self.cost_model);
        self.fast_agent = fast_agent;
        self.orchestrator = orchestrator;
    }

    /// `/fast <query>`: a single ReAct worker over the whole query, no
    /// planning or synthesis step.
    pub async fn run_fast(&self, query: &str, cancel: &CancelToken) -> Session {
        let session = Session::new(self.ids.next(), query, Mode::Fast);
        self.execute_fast(session, cancel).await
    }

    /// `/deep <query>`: complexity-scored plan, bounded worker pool, then
    /// synthesis.
    pub async fn run_deep(&self, query: &str, cancel: &CancelToken) -> Session {
        let session = Session::new(self.ids.next(), query, Mode::Deep);
        self.execute_deep(session, cancel).await
    }

    /// Run an already-constructed session — typically the child returned by
    /// [`Self::expand`] — to completion, dispatching on its `mode`. Keeps
    /// the child's id, `parent_id`, and `version` instead of minting a new
    /// root session the way [`Self::run_fast`]/[`Self::run_deep`] do.
    pub async fn run_expansion(&self, session: Session, cancel: &CancelToken) -> Session {
        match session.mode {
            Mode::Fast => self.execute_fast(session, cancel).await,
            Mode::Deep => self.execute_deep(session, cancel).await,
        }
    }

    async fn execute_fast(&self, mut session: Session, cancel: &CancelToken) -> Session {
        session.status = SessionStatus::Running;
        self.bus.publish(Event::new(EventData::SessionStarted { session_id: session.id.clone() }));

        let pending = Worker::new(
            WorkerId::new("task-1"),
            1,
            session.query.as_str(),
            SINGLE_WORKER_EXPECTED_OUTPUT,
            BTreeSet::new(),
        );
        let worker = run_worker(&self.fast_agent, &self.tools, self.bus.as_ref(), &session.id, pending, cancel)
            .await;

        self.finish_with_workers(&mut session, vec![worker]);
        session
    }

    async fn execute_deep(&self, mut session: Session, cancel: &CancelToken) -> Session {
        session.status = SessionStatus::Running;
        self.bus.publish(Event::new(EventData::SessionStarted { session_id: session.id.clone() }));

        match self.orchestrator.run(&session.id, &session.query, Arc::clone(&self.bus), cancel).await {
            Ok(outcome) => {
                session.complexity_score = outcome.complexity_score;
                session.report = outcome.report;
                self.finish_with_workers(&mut session, outcome.workers);
            }
            Err(err) => {
                session.status = SessionStatus::Failed;
                session.report = format!("research failed: {err}");
                session.updated_at = Utc::now();
                self.bus.publish(Event::new(EventData::SessionFinished {
                    session_id: session.id.clone(),
                    status: session.status,
                    cost: session.cost,
                }));
            }
        }
        session
    }

    /// The diffusion strategy: an iterative draft/refine loop instead of
    /// the one-shot plan→pool→synthesize flow. `initial_draft` seeds the
    /// first iteration; pass an empty string to start from nothing.
    pub async fn run_diffusion(
        &self,
        query: &str,
        initial_draft: &str,
    ) -> Result<Session, ProviderError> {
        let id = self.ids.next();
        let mut session = Session::new(id.clone(), query, Mode::Deep);
        session.status = SessionStatus::Running;
        self.bus.publish(Event::new(EventData::SessionStarted { session_id: id.clone() }));

        let supervisor = DiffusionSupervisor::new(
            self.provider.clone(),
            Arc::clone(&self.tools),
            self.config.diffusion.clone(),
        )
        .with_cost_model(self.cost_model.clone());

        let outcome = supervisor.run(query, initial_draft).await?;
        session.report = outcome.report;
        session.cost = outcome.cost;
        for source in outcome.sources.iter() {
            session.sources.insert(source);
        }
        session.status = SessionStatus::Complete;
        session.updated_at = Utc::now();
        self.bus.publish(Event::new(EventData::SessionFinished {
            session_id: id,
            status: session.status,
            cost: session.cost,
        }));
        Ok(session)
    }

    /// `/recompile [instructions]`: re-run the synthesizer over `session`'s
    /// existing worker outputs, optionally with extra guidance. Leaves the
    /// worker records untouched.
    pub async fn recompile(
        &self,
        session: &mut Session,
        extra_instructions: Option<&str>,
    ) -> Result<(), ProviderError> {
        let synthesizer = Synthesizer::new(self.provider.clone()).with_cost_model(self.cost_model.clone());
        let (report, cost) =
            synthesizer.synthesize(&session.query, &session.workers, extra_instructions).await?;
        session.report = report;
        session.cost.add(&cost);
        session.updated_at = Utc::now();
        Ok(())
    }

    /// `/rerun <n>`: re-run one worker's objective, replacing its record in
    /// place.
    ///
    /// This mutates `session` in place and bumps its `version` on the same
    /// session id, rather than minting a child session: `/rerun` is a
    /// correction to a specific worker within an existing research run, not
    /// a new research run, so it does not belong in the parent/child
    /// versioning chain that [`Session::new_version`] models for
    /// expansions. See `DESIGN.md` for the full rationale.
    pub async fn rerun_worker(
        &self,
        session: &mut Session,
        worker_index: usize,
        cancel: &CancelToken,
    ) -> Result<(), OrchError> {
        let existing = session
            .workers
            .get(worker_index)
            .ok_or_else(|| OrchError::DispatchFailed(format!("no worker at index {worker_index}")))?;

        let pending = Worker::new(
            existing.id.clone(),
            existing.worker_num,
            existing.objective.clone(),
            existing.expected_output.clone(),
            existing.tools_available.clone(),
        );
        let result =
            run_worker(&self.fast_agent, &self.tools, self.bus.as_ref(), &session.id, pending, cancel)
                .await;

        session.workers[worker_index] = result;
        session.recompute_cost();
        session.version += 1;
        session.updated_at = Utc::now();
        Ok(())
    }

    /// `/expand <text>` (or bare follow-up text): mint a new session version
    /// seeded with a continuation context built from `session`.
    pub fn expand(&self, session: &mut Session, follow_up: &str) -> Session {
        let context = build_continuation_context(session);
        session.new_version(format!("{follow_up}\n\n{context}"))
    }

    fn finish_with_workers(&self, session: &mut Session, workers: Vec<Worker>) {
        for worker in &workers {
            for source in &worker.sources {
                session.sources.insert(source.clone());
            }
        }
        session.cost = workers.iter().map(|w| w.cost).sum();
        if session.report.is_empty() {
            if let [only] = workers.as_slice() {
                session.report = only.final_output.clone();
            }
        }
        let any_complete = workers.iter().any(|w| w.status == WorkerStatus::Complete);
        session.workers = workers;
        session.status = if any_complete { SessionStatus::Complete } else { SessionStatus::Failed };
        session.updated_at = Utc::now();
        self.bus.publish(Event::new(EventData::SessionFinished {
            session_id: session.id.clone(),
            status: session.status,
            cost: session.cost,
        }));
    }
}
