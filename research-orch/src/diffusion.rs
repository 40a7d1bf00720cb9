//! Diffusion-style research supervisor: an alternative to plan→pool→synthesize
//! that treats a draft report as a noisy initial guess, progressively refined
//! by bounded rounds of targeted research rather than decomposed up front.
//!
//! Each round the supervisor model sees the brief, the current draft, and
//! the notes accumulated so far, and chooses among four tools expressed in
//! the same tag protocol [`research_agent`] uses for its own ReAct loop:
//! `conduct_research` (delegates to a bounded sub-researcher), `refine_draft`,
//! `think` (a recorded no-op reflection), and `research_complete`.
//! `research_complete` only ends the loop once a round's `conduct_research`
//! calls turn up no sources beyond what's already been found — a draft that
//! merely looks finished isn't enough.

use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{iter, StreamExt};
use layer0::{CostBreakdown, SourceList};
use research_agent::{extract_urls, parse_answer, parse_tool_calls};
use research_llm::cost::CostModel;
use research_llm::{ContentPart, Provider, ProviderError, ProviderMessage, ProviderRequest, Role};
use research_tool::ToolRegistry;

use crate::util::response_text;

/// Tunables for one [`DiffusionSupervisor`] run.
#[derive(Debug, Clone)]
pub struct DiffusionConfig {
    /// Maximum number of supervisor rounds before giving up unconverged.
    pub max_iterations: u32,
    /// Iteration budget handed to each `conduct_research` sub-researcher.
    pub sub_researcher_max_iterations: u32,
    /// Maximum `conduct_research` calls run concurrently within one round.
    pub max_parallel_sub_research: usize,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self { max_iterations: 15, sub_researcher_max_iterations: 5, max_parallel_sub_research: 3 }
    }
}

/// Result of a full diffusion run.
#[derive(Debug, Clone)]
pub struct DiffusionOutcome {
    /// The final-report pass's markdown output.
    pub report: String,
    /// How many supervisor rounds actually ran.
    pub iterations_run: u32,
    /// Whether the loop ended via a verified `research_complete` rather than
    /// hitting [`DiffusionConfig::max_iterations`].
    pub converged: bool,
    /// URLs accumulated across every `conduct_research` call.
    pub sources: SourceList,
    /// Every `think` reflection, in order.
    pub reflections: Vec<String>,
    /// Token/dollar cost summed across every provider call made.
    pub cost: CostBreakdown,
}

const TOOL_MANIFEST: &str = r#"You are supervising an iterative research process. You have access to these tools:
- conduct_research: delegate to a sub-researcher. Input: {"topic": "<string>"}. You may issue several of these in one response to research different angles in parallel.
- refine_draft: rewrite the current draft using the brief and accumulated notes. Input: {}.
- think: record a private reflection on your progress, visible only in the trace, not the report. Input: {"reflection": "<string>"}.
- research_complete: end the research loop. Input: {}. This is only honored once a round's conduct_research calls turn up no sources beyond what's already been found; otherwise you will be asked to verify further before it takes effect.

Respond with one or more <tool name="...">{...json...}</tool> tags per turn."#;

/// Runs the diffusion loop and produces a final report.
pub struct DiffusionSupervisor<P: Provider> {
    provider: P,
    tools: Arc<ToolRegistry>,
    cost_model: CostModel,
    config: DiffusionConfig,
}

impl<P: Provider> DiffusionSupervisor<P> {
    /// Build a supervisor around `provider`, giving sub-researchers access
    /// to `tools`.
    pub fn new(provider: P, tools: Arc<ToolRegistry>, config: DiffusionConfig) -> Self {
        Self { provider, tools, cost_model: CostModel::with_defaults(), config }
    }

    /// Override the cost model.
    #[must_use]
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Run the loop from `initial_draft` (typically the model's unaided
    /// best guess) until convergence or [`DiffusionConfig::max_iterations`].
    pub async fn run(
        &self,
        brief: &str,
        initial_draft: &str,
    ) -> Result<DiffusionOutcome, ProviderError> {
        let mut draft = initial_draft.to_string();
        let mut notes = String::new();
        let mut sources = SourceList::new();
        let mut reflections = Vec::new();
        let mut cost = CostBreakdown::ZERO;
        let mut converged = false;
        let mut iterations_run = 0;

        for iteration in 1..=self.config.max_iterations {
            iterations_run = iteration;

            let response = self.call(&self.build_prompt(brief, &draft, &notes)).await?;
            cost.add(&self.cost_for(&response));
            let text = response_text(&response.content);
            let calls = parse_tool_calls(&text);

            let mut completion_requested = false;
            let mut conduct_topics = Vec::new();
            let mut refine_requested = false;

            for call in &calls {
                match call.name.as_str() {
                    "conduct_research" => {
                        if let Ok(args) = serde_json::from_str::<serde_json::Value>(&call.raw_args) {
                            if let Some(topic) = args.get("topic").and_then(|v| v.as_str()) {
                                conduct_topics.push(topic.to_string());
                            }
                        }
                    }
                    "think" => {
                        if let Ok(args) = serde_json::from_str::<serde_json::Value>(&call.raw_args) {
                            if let Some(reflection) = args.get("reflection").and_then(|v| v.as_str()) {
                                reflections.push(reflection.to_string());
                            }
                        }
                    }
                    "refine_draft" => refine_requested = true,
                    "research_complete" => completion_requested = true,
                    _ => {}
                }
            }

            let mut verified_no_new_findings = false;
            if !conduct_topics.is_empty() {
                let before = sources.len();
                let results = self.run_sub_researchers(&conduct_topics).await;
                for (topic, (summary, found_sources, round_cost)) in conduct_topics.iter().zip(results) {
                    notes.push_str(&format!("\n### {topic}\n{summary}\n"));
                    for url in found_sources.iter() {
                        sources.insert(url);
                    }
                    cost.add(&round_cost);
                }
                verified_no_new_findings = sources.len() == before;
            }

            if refine_requested {
                draft = self.refine_draft(brief, &draft, &notes, &mut cost).await?;
            }

            if completion_requested && verified_no_new_findings {
                converged = true;
                break;
            }
        }

        let report = self.final_report(brief, &draft, &notes, &mut cost).await?;
        Ok(DiffusionOutcome { report, iterations_run, converged, sources, reflections, cost })
    }

    fn build_prompt(&self, brief: &str, draft: &str, notes: &str) -> String {
        format!(
            "Research brief:\n{brief}\n\nCurrent draft report:\n{draft}\n\n\
             Accumulated research notes:\n{notes}\n\n\
             Decide your next action using the tools described in the system prompt."
        )
    }

    async fn run_sub_researchers(
        &self,
        topics: &[String],
    ) -> Vec<(String, SourceList, CostBreakdown)> {
        let cap = self.config.max_parallel_sub_research.max(1);
        iter(topics.iter())
            .map(|topic| {
                sub_research(
                    &self.provider,
                    &self.tools,
                    topic,
                    self.config.sub_researcher_max_iterations,
                    &self.cost_model,
                )
            })
            .buffered(cap)
            .collect()
            .await
    }

    async fn refine_draft(
        &self,
        brief: &str,
        draft: &str,
        notes: &str,
        cost: &mut CostBreakdown,
    ) -> Result<String, ProviderError> {
        let prompt = format!(
            "Brief:\n{brief}\n\nCurrent draft:\n{draft}\n\nAccumulated research notes:\n{notes}\n\n\
             Rewrite the draft to incorporate the notes, improving accuracy and \
             completeness. Respond with only the rewritten draft."
        );
        let response = self.call(&prompt).await?;
        cost.add(&self.cost_for(&response));
        Ok(response_text(&response.content))
    }

    async fn final_report(
        &self,
        brief: &str,
        draft: &str,
        notes: &str,
        cost: &mut CostBreakdown,
    ) -> Result<String, ProviderError> {
        let prompt = format!(
            "Brief:\n{brief}\n\nFinal draft:\n{draft}\n\nAll accumulated research notes:\n{notes}\n\n\
             Produce the final research report in markdown. Prioritize insightfulness \
             and helpfulness to the reader over restating the draft verbatim: surface \
             the most load-bearing findings, note open questions, and cite sources \
             inline where available."
        );
        let response = self.call(&prompt).await?;
        cost.add(&self.cost_for(&response));
        Ok(response_text(&response.content))
    }

    fn call(&self, prompt: &str) -> impl Future<Output = Result<research_llm::ProviderResponse, ProviderError>> + Send + '_ {
        self.provider.complete(ProviderRequest {
            model: None,
            messages: vec![ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text { text: prompt.to_string() }],
            }],
            tools: vec![],
            max_tokens: Some(2048),
            temperature: Some(0.2),
            system: Some(TOOL_MANIFEST.to_string()),
            extra: serde_json::Value::Null,
        })
    }

    fn cost_for(&self, response: &research_llm::ProviderResponse) -> CostBreakdown {
        self.cost_model.new_cost_breakdown(
            &response.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        )
    }
}

/// One bounded sub-research pass: a miniature ReAct loop over `topic`,
/// sharing `provider`'s tag protocol but with its own tight iteration cap
/// and no budget-nudge logic (the cap is already small enough not to need
/// one). Returns a compressed notes block plus any sources it touched.
async fn sub_research<P: Provider>(
    provider: &P,
    tools: &ToolRegistry,
    topic: &str,
    max_iterations: u32,
    cost_model: &CostModel,
) -> (String, SourceList, CostBreakdown) {
    let system = format!(
        "You are a focused sub-researcher. Research the following topic and \
         produce a compressed notes block of the key findings.\n\n\
         You have access to the following tools:\n{}\n\
         To call a tool, respond with exactly this form and nothing else:\n\
         <tool name=\"tool_name\">{{\"arg\": \"value\"}}</tool>\n\n\
         When you have enough information, respond with:\n\
         <answer>your compressed notes</answer>",
        tool_manifest(tools)
    );
    let mut messages = vec![ProviderMessage {
        role: Role::User,
        content: vec![ContentPart::Text { text: topic.to_string() }],
    }];
    let mut sources = SourceList::new();
    let mut cost = CostBreakdown::ZERO;

    for _ in 1..=max_iterations.max(1) {
        let request = ProviderRequest {
            model: None,
            messages: messages.clone(),
            tools: vec![],
            max_tokens: Some(2048),
            temperature: None,
            system: Some(system.clone()),
            extra: serde_json::Value::Null,
        };
        let response = match provider.complete(request).await {
            Ok(r) => r,
            Err(e) => return (format!("sub-research on \"{topic}\" failed: {e}"), sources, cost),
        };
        cost.add(&cost_model.new_cost_breakdown(
            &response.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        ));
        let text = response_text(&response.content);
        messages.push(ProviderMessage {
            role: Role::Assistant,
            content: vec![ContentPart::Text { text: text.clone() }],
        });

        if let Some(answer) = parse_answer(&text) {
            for url in extract_urls(&answer) {
                sources.insert(url);
            }
            return (answer, sources, cost);
        }

        let calls = parse_tool_calls(&text);
        if calls.is_empty() {
            messages.push(ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text {
                    text: "Call a tool or respond with <answer>...</answer>.".to_string(),
                }],
            });
            continue;
        }

        let mut observations = Vec::with_capacity(calls.len());
        for call in calls {
            let parsed_args: Result<serde_json::Value, _> = serde_json::from_str(&call.raw_args);
            let observation = match parsed_args {
                Ok(args) => match tools.execute(&call.name, args).await {
                    Ok(result) => {
                        for url in extract_urls(&result) {
                            sources.insert(url);
                        }
                        result
                    }
                    Err(e) => format!("Error: {e}"),
                },
                Err(e) => format!("Error: invalid JSON arguments for tool \"{}\": {e}", call.name),
            };
            observations.push(format!("[{}] {}", call.name, observation));
        }
        messages.push(ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: observations.join("\n\n") }],
        });
    }

    (format!("Sub-research on \"{topic}\" concluded after maximum iterations."), sources, cost)
}

fn tool_manifest(tools: &ToolRegistry) -> String {
    let mut manifest = String::new();
    for tool in tools.iter() {
        manifest.push_str(&format!(
            "- {}: {} Input schema: {}\n",
            tool.name(),
            tool.description(),
            tool.input_schema()
        ));
    }
    manifest
}
