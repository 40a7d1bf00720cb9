//! Complexity scoring and plan generation (the orchestrator's "Plan" stage).
//!
//! Two LLM calls: one to rate how complex a query is, one to break it into
//! parallel sub-tasks. Both tolerate a model that ignores the "respond with
//! only JSON" instruction by scanning the response for the first top-level
//! JSON value; both fall back to a safe default rather than failing the
//! whole research run on a parse error.

use layer0::CostBreakdown;
use research_llm::cost::CostModel;
use research_llm::{ContentPart, Provider, ProviderError, ProviderMessage, ProviderRequest, Role};

use crate::util::{extract_json, response_text};

/// Complexity score below which a query gets a single worker.
const LOW_COMPLEXITY_THRESHOLD: f64 = 0.3;
/// Complexity score at or above which a query gets five workers.
const HIGH_COMPLEXITY_THRESHOLD: f64 = 0.6;
/// Worker counts for the low, medium, and high complexity bands.
const LOW_WORKERS: u32 = 1;
const MEDIUM_WORKERS: u32 = 3;
const HIGH_WORKERS: u32 = 5;
/// Score used when the model's response can't be parsed or is out of range.
const FALLBACK_SCORE: f64 = 0.5;

/// One sub-task produced by [`Planner::create_plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// What this worker should research.
    pub objective: String,
    /// What a complete answer for this task looks like.
    pub expected_output: String,
}

/// Map a complexity score in `[0, 1]` to a worker count.
///
/// `< 0.3` gets one worker, `[0.3, 0.6)` gets three, `>= 0.6` gets five.
pub fn worker_count_for_score(score: f64) -> u32 {
    if score < LOW_COMPLEXITY_THRESHOLD {
        LOW_WORKERS
    } else if score < HIGH_COMPLEXITY_THRESHOLD {
        MEDIUM_WORKERS
    } else {
        HIGH_WORKERS
    }
}

/// Scores query complexity and decomposes a query into parallel sub-tasks.
pub struct Planner<P: Provider> {
    provider: P,
    cost_model: CostModel,
}

impl<P: Provider> Planner<P> {
    /// Build a planner around `provider`, using [`CostModel::with_defaults`].
    pub fn new(provider: P) -> Self {
        Self { provider, cost_model: CostModel::with_defaults() }
    }

    /// Override the cost model, e.g. with prices for a non-default model.
    #[must_use]
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Rate how complex `query` is on a `[0, 1]` scale.
    ///
    /// A response the planner can't parse into a score in range falls back
    /// to [`FALLBACK_SCORE`] rather than failing the call.
    pub async fn analyze_complexity(
        &self,
        query: &str,
    ) -> Result<(f64, CostBreakdown), ProviderError> {
        let prompt = format!(
            "Rate the research complexity of this query on a scale from 0 to 1, \
             where 0 is a simple factual lookup answerable by one focused \
             search and 1 is a deep, multi-faceted investigation needing \
             several independent lines of research. Respond with only a JSON \
             object: {{\"score\": <number>, \"reason\": \"<string>\"}}.\n\n\
             Query: {query}"
        );
        let response = self.call(&prompt).await?;
        let cost = self.cost_for(&response);
        let score = parse_score(&response_text(&response.content)).unwrap_or(FALLBACK_SCORE);
        Ok((score, cost))
    }

    /// Decompose `query` into at most `num_workers` independent sub-tasks.
    ///
    /// A response the planner can't parse into a task array falls back to an
    /// empty plan, leaving the caller to decide how to degrade.
    pub async fn create_plan(
        &self,
        query: &str,
        num_workers: u32,
    ) -> Result<(Vec<Task>, CostBreakdown), ProviderError> {
        let prompt = format!(
            "Break this research query into at most {num_workers} independent \
             sub-tasks that can be researched in parallel, each covering a \
             distinct angle with no significant overlap. Respond with only a \
             JSON array, each element shaped \
             {{\"objective\": \"<string>\", \"expected_output\": \"<string>\"}}.\n\n\
             Query: {query}"
        );
        let response = self.call(&prompt).await?;
        let cost = self.cost_for(&response);
        let mut tasks = parse_tasks(&response_text(&response.content));
        tasks.truncate(num_workers as usize);
        Ok((tasks, cost))
    }

    async fn call(
        &self,
        prompt: &str,
    ) -> Result<research_llm::ProviderResponse, ProviderError> {
        self.provider
            .complete(ProviderRequest {
                model: None,
                messages: vec![ProviderMessage {
                    role: Role::User,
                    content: vec![ContentPart::Text { text: prompt.to_string() }],
                }],
                tools: vec![],
                max_tokens: Some(1024),
                temperature: Some(0.0),
                system: None,
                extra: serde_json::Value::Null,
            })
            .await
    }

    fn cost_for(&self, response: &research_llm::ProviderResponse) -> CostBreakdown {
        self.cost_model.new_cost_breakdown(
            &response.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        )
    }
}

fn parse_score(text: &str) -> Option<f64> {
    let value = extract_json(text)?;
    let score = value.get("score")?.as_f64()?;
    if (0.0..=1.0).contains(&score) {
        Some(score)
    } else {
        None
    }
}

fn parse_tasks(text: &str) -> Vec<Task> {
    let Some(value) = extract_json(text) else { return Vec::new() };
    let Some(array) = value.as_array() else { return Vec::new() };
    array
        .iter()
        .filter_map(|item| {
            let objective = item.get("objective")?.as_str()?.to_string();
            let expected_output = item.get("expected_output")?.as_str()?.to_string();
            Some(Task { objective, expected_output })
        })
        .collect()
}
