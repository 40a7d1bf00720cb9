//! Wraps one [`ReactAgent`] run with event-bus publication and converts
//! agent failures into a degraded [`Worker`] record.
//!
//! A single worker's failure must never abort the rest of a pool: callers
//! always get back a terminal `Worker`, never a bare `Err`.

use std::collections::BTreeSet;

use chrono::Utc;
use layer0::{CancelToken, Event, EventBus, EventData, SessionId, Worker, WorkerStatus};
use research_llm::Provider;
use research_tool::ToolRegistry;

use crate::agent::ReactAgent;

/// Run `worker`'s objective through `agent`, publishing
/// [`EventType::WorkerStarted`](layer0::EventType::WorkerStarted) before and
/// [`EventType::WorkerComplete`](layer0::EventType::WorkerComplete) or
/// [`EventType::WorkerFailed`](layer0::EventType::WorkerFailed) after.
///
/// `worker.tools_available` is passed through to [`ReactAgent::run`] as the
/// allowed-tool filter; an empty set means every tool in `tools` is usable.
/// A cancelled `cancel` token surfaces as `status=failed, error="cancelled"`,
/// matching every other worker failure path.
pub async fn run_worker<P: Provider>(
    agent: &ReactAgent<P>,
    tools: &ToolRegistry,
    bus: &dyn EventBus,
    session_id: &SessionId,
    mut worker: Worker,
    cancel: &CancelToken,
) -> Worker {
    worker.status = WorkerStatus::Running;
    bus.publish(Event::new(EventData::WorkerStarted {
        session_id: session_id.clone(),
        worker_id: worker.id.clone(),
        objective: worker.objective.clone(),
    }));

    let allowed: BTreeSet<String> = worker.tools_available.clone();
    match agent.run(&worker.objective, tools, &allowed, cancel).await {
        Ok(outcome) => {
            for iteration in &outcome.iterations {
                bus.publish(Event::new(EventData::IterationComplete {
                    session_id: session_id.clone(),
                    worker_id: worker.id.clone(),
                    iteration: iteration.clone(),
                }));
            }
            for call in &outcome.tool_calls {
                bus.publish(Event::new(EventData::ToolCallComplete {
                    session_id: session_id.clone(),
                    worker_id: worker.id.clone(),
                    call: call.clone(),
                }));
            }

            worker.iterations = outcome.iterations;
            worker.tool_calls = outcome.tool_calls;
            worker.sources = outcome.sources.iter().map(str::to_string).collect();
            worker.final_output = outcome.final_output.clone();
            worker.summary = outcome.final_output;
            worker.cost = outcome.cost;
            worker.status = WorkerStatus::Complete;
            worker.completed_at = Some(Utc::now());

            bus.publish(Event::new(EventData::WorkerComplete {
                session_id: session_id.clone(),
                worker_id: worker.id.clone(),
                cost: worker.cost,
            }));
        }
        Err(err) => {
            worker.status = WorkerStatus::Failed;
            worker.error = Some(err.to_string());
            worker.completed_at = Some(Utc::now());

            bus.publish(Event::new(EventData::WorkerFailed {
                session_id: session_id.clone(),
                worker_id: worker.id.clone(),
                error: err.to_string(),
            }));
        }
    }

    worker
}
