//! Combines worker outputs into one markdown report (the orchestrator's
//! "Synthesis" stage).
//!
//! One LLM call: every completed worker's objective and final output, plus
//! a note of which workers failed and why, goes into the prompt. The model
//! is instructed to synthesize rather than concatenate — draw connections
//! across workers, call out contradictions or gaps, and attribute claims to
//! sources inline.

use layer0::{CostBreakdown, Worker, WorkerStatus};
use research_llm::cost::CostModel;
use research_llm::{ContentPart, Provider, ProviderError, ProviderMessage, ProviderRequest, Role};

use crate::util::response_text;

const SYSTEM_PROMPT: &str = "You are a research synthesizer. Combine the worker \
findings below into a single, coherent markdown report. Do not simply \
concatenate the findings: synthesize them, drawing connections across \
workers, explicitly noting contradictions or gaps, and attributing claims \
to sources inline where available.";

/// Synthesizes a final report from a completed worker pool's results.
pub struct Synthesizer<P: Provider> {
    provider: P,
    cost_model: CostModel,
}

impl<P: Provider> Synthesizer<P> {
    /// Build a synthesizer around `provider`, using [`CostModel::with_defaults`].
    pub fn new(provider: P) -> Self {
        Self { provider, cost_model: CostModel::with_defaults() }
    }

    /// Override the cost model.
    #[must_use]
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Produce the final markdown report for `query` from `workers`.
    ///
    /// `extra_instructions`, when present, is appended verbatim — used by
    /// `/recompile` to re-run synthesis with additional guidance over the
    /// same worker outputs.
    pub async fn synthesize(
        &self,
        query: &str,
        workers: &[Worker],
        extra_instructions: Option<&str>,
    ) -> Result<(String, CostBreakdown), ProviderError> {
        let prompt = build_prompt(query, workers, extra_instructions);
        let response = self
            .provider
            .complete(ProviderRequest {
                model: None,
                messages: vec![ProviderMessage {
                    role: Role::User,
                    content: vec![ContentPart::Text { text: prompt }],
                }],
                tools: vec![],
                max_tokens: Some(4096),
                temperature: Some(0.3),
                system: Some(SYSTEM_PROMPT.to_string()),
                extra: serde_json::Value::Null,
            })
            .await?;
        let cost = self.cost_model.new_cost_breakdown(
            &response.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        );
        Ok((response_text(&response.content), cost))
    }
}

fn build_prompt(query: &str, workers: &[Worker], extra_instructions: Option<&str>) -> String {
    let mut prompt = format!("Research query: {query}\n\nWorker findings:\n\n");
    for worker in workers {
        match worker.status {
            WorkerStatus::Complete => {
                prompt.push_str(&format!("## {}\n\n{}\n\n", worker.objective, worker.final_output));
                if !worker.sources.is_empty() {
                    prompt.push_str("Sources:\n");
                    for source in &worker.sources {
                        prompt.push_str(&format!("- {source}\n"));
                    }
                    prompt.push('\n');
                }
            }
            _ => {
                prompt.push_str(&format!(
                    "## {} (failed: {})\n\n",
                    worker.objective,
                    worker.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }
    if let Some(extra) = extra_instructions {
        prompt.push_str(&format!("\nAdditional instructions: {extra}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::WorkerId;
    use research_llm::types::{ProviderResponse, TokenUsage};
    use research_llm::StopReason;
    use std::collections::BTreeSet;
    use std::future::Future;
    use std::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
        last_prompt: Mutex<String>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
            responses.reverse();
            Self { responses: Mutex::new(responses), last_prompt: Mutex::new(String::new()) }
        }
    }

    impl Provider for ScriptedProvider {
        fn complete(
            &self,
            request: ProviderRequest,
        ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
            async move {
                if let ContentPart::Text { text } = &request.messages[0].content[0] {
                    *self.last_prompt.lock().unwrap() = text.clone();
                }
                self.responses
                    .lock()
                    .unwrap()
                    .pop()
                    .unwrap_or_else(|| Err(ProviderError::InvalidRequest("exhausted".into())))
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
            usage: TokenUsage { input_tokens: 30, output_tokens: 15, ..Default::default() },
            model: "mock-model".to_string(),
            cost: None,
            truncated: None,
        }
    }

    fn complete_worker(objective: &str, output: &str, sources: Vec<String>) -> Worker {
        let mut worker =
            Worker::new(WorkerId::new("w1"), 1, objective, "expected", BTreeSet::new());
        worker.status = WorkerStatus::Complete;
        worker.final_output = output.to_string();
        worker.sources = sources;
        worker
    }

    fn failed_worker(objective: &str, error: &str) -> Worker {
        let mut worker =
            Worker::new(WorkerId::new("w2"), 2, objective, "expected", BTreeSet::new());
        worker.status = WorkerStatus::Failed;
        worker.error = Some(error.to_string());
        worker
    }

    #[tokio::test]
    async fn synthesize_includes_worker_headings_and_sources() {
        let provider = ScriptedProvider::new(vec![Ok(text_response("# Report\n\nSynthesized."))]);
        let synthesizer = Synthesizer::new(provider);
        let workers = vec![complete_worker(
            "research rust async runtimes",
            "tokio dominates",
            vec!["https://tokio.rs".to_string()],
        )];
        let (report, cost) = synthesizer.synthesize("async runtimes", &workers, None).await.unwrap();
        assert_eq!(report, "# Report\n\nSynthesized.");
        assert!(cost.total_tokens > 0);
        let prompt = synthesizer.provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("research rust async runtimes"));
        assert!(prompt.contains("https://tokio.rs"));
    }

    #[tokio::test]
    async fn synthesize_notes_failed_workers() {
        let provider = ScriptedProvider::new(vec![Ok(text_response("report acknowledging gaps"))]);
        let synthesizer = Synthesizer::new(provider);
        let workers = vec![failed_worker("research X", "timeout")];
        let (_report, _) = synthesizer.synthesize("query", &workers, None).await.unwrap();
        let prompt = synthesizer.provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("failed: timeout"));
    }

    #[tokio::test]
    async fn extra_instructions_are_appended() {
        let provider = ScriptedProvider::new(vec![Ok(text_response("recompiled report"))]);
        let synthesizer = Synthesizer::new(provider);
        let workers = vec![complete_worker("research X", "finding", vec![])];
        let _ = synthesizer
            .synthesize("query", &workers, Some("emphasize security implications"))
            .await
            .unwrap();
        let prompt = synthesizer.provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("emphasize security implications"));
    }
}
