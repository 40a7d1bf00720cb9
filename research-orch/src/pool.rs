//! Bounded-concurrency execution of a plan's worker tasks.
//!
//! Workers run at most [`WorkerPool::max_workers`] at a time, each through
//! its own [`research_agent::run_worker`] call (which already degrades any
//! internal failure into a `status=failed` record instead of an `Err`), and
//! come back index-aligned with the input order regardless of which one
//! finishes first.

use std::sync::Arc;

use layer0::{CancelToken, EventBus, SessionId, Worker, WorkerStatus};
use research_agent::{run_worker, ReactAgent};
use research_llm::Provider;
use research_tool::ToolRegistry;
use tokio::sync::Semaphore;

/// Runs a fixed-size pool of concurrent ReAct agents over a set of workers.
pub struct WorkerPool<P: Provider> {
    agent: Arc<ReactAgent<P>>,
    tools: Arc<ToolRegistry>,
    max_workers: usize,
}

impl<P: Provider + Send + Sync + 'static> WorkerPool<P> {
    /// Build a pool that runs at most `max_workers` agents concurrently.
    pub fn new(agent: Arc<ReactAgent<P>>, tools: Arc<ToolRegistry>, max_workers: usize) -> Self {
        Self { agent, tools, max_workers: max_workers.max(1) }
    }

    /// Run every worker in `workers`, returning one result per input,
    /// index-aligned. `cancel` is shared across every spawned run; cancelling
    /// it mid-flight lets each worker finish its current iteration and come
    /// back `status=failed, error="cancelled"` rather than aborting abruptly.
    pub async fn execute(
        &self,
        session_id: &SessionId,
        bus: Arc<dyn EventBus>,
        workers: Vec<Worker>,
        cancel: &CancelToken,
    ) -> Vec<Worker> {
        if workers.is_empty() {
            return Vec::new();
        }

        let permits = self.max_workers.min(workers.len());
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut handles = Vec::with_capacity(workers.len());

        for worker in workers {
            let fallback = worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let agent = Arc::clone(&self.agent);
            let tools = Arc::clone(&self.tools);
            let bus = Arc::clone(&bus);
            let session_id = session_id.clone();
            let cancel = cancel.clone();

            handles.push((
                fallback,
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                    run_worker(&agent, &tools, bus.as_ref(), &session_id, worker, &cancel).await
                }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (fallback, handle) in handles {
            match handle.await {
                Ok(worker) => results.push(worker),
                Err(join_err) => {
                    let mut degraded = fallback;
                    degraded.status = WorkerStatus::Failed;
                    degraded.error = Some(format!("worker task panicked: {join_err}"));
                    degraded.completed_at = Some(chrono::Utc::now());
                    results.push(degraded);
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::{Event, EventSubscription, EventType, WorkerId};
    use research_agent::AgentConfig;
    use research_llm::provider::ProviderError;
    use research_llm::types::{ProviderResponse, TokenUsage};
    use research_llm::{ContentPart, ProviderRequest, StopReason};
    use std::collections::BTreeSet;
    use std::future::Future;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<std::collections::HashMap<String, Result<ProviderResponse, ProviderError>>>,
    }

    impl ScriptedProvider {
        fn keyed(responses: Vec<(&str, Result<ProviderResponse, ProviderError>)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                ),
            }
        }
    }

    impl Provider for ScriptedProvider {
        fn complete(
            &self,
            request: ProviderRequest,
        ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
            async move {
                let objective = match &request.messages[0].content[0] {
                    ContentPart::Text { text } => text.clone(),
                    _ => String::new(),
                };
                let mut map = self.responses.lock().await;
                map.remove(&objective)
                    .unwrap_or_else(|| Err(ProviderError::InvalidRequest("no script for objective".into())))
            }
        }

        fn complete_stream(
            &self,
            _request: ProviderRequest,
            _handler: impl research_llm::StreamHandler,
        ) -> impl Future<Output = Result<(), ProviderError>> + Send {
            async { Ok(()) }
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn set_model(&mut self, _model: impl Into<String>) {}
    }

    fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: vec![ContentPart::Text { text: text.to_string() }],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage { input_tokens: 10, output_tokens: 5, ..Default::default() },
            model: "mock-model".to_string(),
            cost: None,
            truncated: None,
        }
    }

    struct RecordingBus {
        events: StdMutex<Vec<Event>>,
    }

    impl RecordingBus {
        fn new() -> Self {
            Self { events: StdMutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl EventBus for RecordingBus {
        async fn subscribe(&self, _types: &[EventType]) -> Box<dyn EventSubscription> {
            struct NoopSub;
            #[async_trait::async_trait]
            impl EventSubscription for NoopSub {
                async fn recv(&mut self) -> Option<Event> {
                    None
                }
            }
            Box::new(NoopSub)
        }

        fn publish(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        fn close(&self) {}
    }

    fn worker(num: u32, objective: &str) -> Worker {
        Worker::new(WorkerId::new(format!("w{num}")), num, objective, "a summary", BTreeSet::new())
    }

    #[tokio::test]
    async fn results_are_index_aligned_regardless_of_completion_order() {
        let provider = ScriptedProvider::keyed(vec![
            ("first", Ok(text_response("<answer>first done</answer>"))),
            ("second", Ok(text_response("<answer>second done</answer>"))),
            ("third", Ok(text_response("<answer>third done</answer>"))),
        ]);
        let agent = Arc::new(ReactAgent::new(provider, AgentConfig::default()));
        let tools = Arc::new(ToolRegistry::new());
        let pool = WorkerPool::new(agent, tools, 2);
        let bus: Arc<dyn EventBus> = Arc::new(RecordingBus::new());
        let session_id = SessionId::new("s1");

        let workers = vec![worker(1, "first"), worker(2, "second"), worker(3, "third")];
        let results = pool.execute(&session_id, bus, workers, &CancelToken::new()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].final_output, "first done");
        assert_eq!(results[1].final_output, "second done");
        assert_eq!(results[2].final_output, "third done");
        for w in &results {
            assert_eq!(w.status, WorkerStatus::Complete);
        }
    }

    #[tokio::test]
    async fn a_failing_worker_does_not_affect_others() {
        let provider = ScriptedProvider::keyed(vec![
            ("ok", Ok(text_response("<answer>fine</answer>"))),
            ("bad", Err(ProviderError::AuthFailed("bad key".into()))),
        ]);
        let agent = Arc::new(ReactAgent::new(provider, AgentConfig::default()));
        let tools = Arc::new(ToolRegistry::new());
        let pool = WorkerPool::new(agent, tools, 2);
        let bus: Arc<dyn EventBus> = Arc::new(RecordingBus::new());
        let session_id = SessionId::new("s1");

        let workers = vec![worker(1, "bad"), worker(2, "ok")];
        let results = pool.execute(&session_id, bus, workers, &CancelToken::new()).await;

        assert_eq!(results[0].status, WorkerStatus::Failed);
        assert_eq!(results[1].status, WorkerStatus::Complete);
    }

    #[tokio::test]
    async fn empty_task_list_returns_empty_results() {
        let provider = ScriptedProvider::keyed(vec![]);
        let agent = Arc::new(ReactAgent::new(provider, AgentConfig::default()));
        let tools = Arc::new(ToolRegistry::new());
        let pool = WorkerPool::new(agent, tools, 3);
        let bus: Arc<dyn EventBus> = Arc::new(RecordingBus::new());
        let session_id = SessionId::new("s1");

        let results = pool.execute(&session_id, bus, Vec::new(), &CancelToken::new()).await;
        assert!(results.is_empty());
    }
}
