//! The tag-based ReAct loop.
//!
//! Unlike a provider's native structured tool-calling, the model is driven
//! entirely through its system prompt and plain-text responses: it is told
//! to emit `<tool name="...">{json}</tool>` to act and `<answer>...</answer>`
//! to conclude. This keeps the agent provider-agnostic and lets the same
//! loop run against any [`Provider`] implementation without depending on
//! that provider's native tool-use wire format.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::Utc;
use layer0::{AgentError, CancelToken, CostBreakdown, Iteration, SourceList, ToolCall};
use research_llm::cost::CostModel;
use research_llm::{ContentPart, Provider, ProviderMessage, ProviderRequest, Role, StopReason};
use research_tool::ToolRegistry;

use crate::tags::{extract_urls, parse_answer, parse_tool_calls};

/// Default bound on ReAct iterations for a single worker run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;
/// Default cumulative token budget for a single worker run.
pub const DEFAULT_MAX_TOKENS_PER_AGENT: u64 = 50_000;
/// Default `max_tokens` requested per provider call.
pub const DEFAULT_MAX_TOKENS_PER_CALL: u32 = 4_096;
/// Fraction of [`AgentConfig::max_tokens_per_agent`] at which the agent is
/// nudged to wrap up.
const BUDGET_NUDGE_FRACTION: f64 = 0.9;
/// Message returned as `final_output` when the iteration cap is hit without
/// an `<answer>` tag. Non-error: an agent that runs out of turns still
/// produced a usable (if incomplete) result.
pub const ITERATION_LIMIT_MESSAGE: &str = "Research concluded after maximum iterations.";

/// Tunables for one [`ReactAgent`] run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base system prompt describing the agent's role; the tool manifest
    /// and tag protocol instructions are appended to this.
    pub system_prompt: String,
    /// Maximum number of Reason-Act-Observe turns before giving up.
    pub max_iterations: u32,
    /// Cumulative input+output token budget across the whole run.
    pub max_tokens_per_agent: u64,
    /// `max_tokens` requested on each individual provider call.
    pub max_tokens_per_call: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens_per_agent: DEFAULT_MAX_TOKENS_PER_AGENT,
            max_tokens_per_call: DEFAULT_MAX_TOKENS_PER_CALL,
        }
    }
}

/// Successful (including iteration-capped) result of a ReAct run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// The `<answer>` body, or [`ITERATION_LIMIT_MESSAGE`] if the run was
    /// cut off by the iteration cap.
    pub final_output: String,
    /// Every turn taken, in order.
    pub iterations: Vec<Iteration>,
    /// Every tool call made, in order.
    pub tool_calls: Vec<ToolCall>,
    /// URLs observed in tool results, first-seen order.
    pub sources: SourceList,
    /// Token/dollar cost summed across every provider call made.
    pub cost: CostBreakdown,
}

/// Runs the tag-based Reason-Act-Observe loop against a [`Provider`].
pub struct ReactAgent<P: Provider> {
    provider: P,
    cost_model: CostModel,
    config: AgentConfig,
}

impl<P: Provider> ReactAgent<P> {
    /// Build an agent around `provider`, using the default (unpriced
    /// unless overridden) [`CostModel`].
    pub fn new(provider: P, config: AgentConfig) -> Self {
        Self { provider, cost_model: CostModel::with_defaults(), config }
    }

    /// Override the cost model, e.g. with [`CostModel::empty`] in tests.
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    fn build_system_prompt(&self, tools: &ToolRegistry, allowed: &BTreeSet<String>) -> String {
        let mut manifest = String::new();
        for tool in tools.iter() {
            if !allowed.is_empty() && !allowed.contains(tool.name()) {
                continue;
            }
            manifest.push_str(&format!(
                "- {}: {} Input schema: {}\n",
                tool.name(),
                tool.description(),
                tool.input_schema()
            ));
        }
        format!(
            "{base}\n\nYou have access to the following tools:\n{manifest}\n\
             To call a tool, respond with exactly this form and nothing else:\n\
             <tool name=\"tool_name\">{{\"arg\": \"value\"}}</tool>\n\n\
             When you have enough information to complete the objective, respond with:\n\
             <answer>your final answer</answer>\n\n\
             Never emit a tool call and an answer in the same response.",
            base = self.config.system_prompt,
        )
    }

    /// Run the loop to completion: an `<answer>` tag, an unrecoverable
    /// model error, cancellation, or the iteration cap.
    pub async fn run(
        &self,
        objective: &str,
        tools: &ToolRegistry,
        allowed_tools: &BTreeSet<String>,
        cancel: &CancelToken,
    ) -> Result<AgentOutcome, AgentError> {
        let system = self.build_system_prompt(tools, allowed_tools);
        let mut messages = vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: objective.to_string() }],
        }];

        let mut iterations = Vec::new();
        let mut tool_calls = Vec::new();
        let mut sources = SourceList::new();
        let mut cost = CostBreakdown::ZERO;

        for iteration_num in 1..=self.config.max_iterations {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            if (cost.total_tokens as f64)
                >= BUDGET_NUDGE_FRACTION * self.config.max_tokens_per_agent as f64
            {
                messages.push(nudge_message());
            }

            let request = ProviderRequest {
                model: None,
                messages: messages.clone(),
                tools: vec![],
                max_tokens: Some(self.config.max_tokens_per_call),
                temperature: None,
                system: Some(system.clone()),
                extra: serde_json::Value::Null,
            };

            let response = self.provider.complete(request).await.map_err(|e| {
                if e.is_retryable() {
                    AgentError::Retryable(e.to_string())
                } else {
                    AgentError::Model(e.to_string())
                }
            })?;

            if response.stop_reason == StopReason::ContentFilter {
                return Err(AgentError::Model("response content was filtered".to_string()));
            }

            cost.add(&self.cost_model.new_cost_breakdown(
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
                iterations.push(Iteration {
                    number: iteration_num,
                    thought: text,
                    action: "answer".to_string(),
                    result: answer.clone(),
                    timestamp: Utc::now(),
                });
                return Ok(AgentOutcome {
                    final_output: answer,
                    iterations,
                    tool_calls,
                    sources,
                    cost,
                });
            }

            let calls = parse_tool_calls(&text);
            if calls.is_empty() {
                iterations.push(Iteration {
                    number: iteration_num,
                    thought: text,
                    action: "none".to_string(),
                    result: String::new(),
                    timestamp: Utc::now(),
                });
                messages.push(ProviderMessage {
                    role: Role::User,
                    content: vec![ContentPart::Text {
                        text: "No tool call or answer tag was recognized in your response. \
                               Call a tool with <tool name=\"...\">...</tool> or conclude with \
                               <answer>...</answer>."
                            .to_string(),
                    }],
                });
                continue;
            }

            let mut tool_names = Vec::with_capacity(calls.len());
            let mut observations = Vec::with_capacity(calls.len());
            for call in calls {
                let started = Instant::now();
                let parsed_args: Result<serde_json::Value, _> =
                    serde_json::from_str(&call.raw_args);

                let (observation, success, args) = match parsed_args {
                    Ok(args) => match tools.execute(&call.name, args.clone()).await {
                        Ok(result) => {
                            for url in extract_urls(&result) {
                                sources.insert(url);
                            }
                            (result, true, args)
                        }
                        Err(e) => (format!("Error: {e}"), false, args),
                    },
                    Err(e) => (
                        format!("Error: invalid JSON arguments for tool \"{}\": {e}", call.name),
                        false,
                        serde_json::Value::Null,
                    ),
                };

                tool_calls.push(ToolCall {
                    tool: call.name.clone(),
                    args,
                    result: observation.clone(),
                    success,
                    duration: started.elapsed().into(),
                    iteration: iteration_num,
                    timestamp: Utc::now(),
                });
                tool_names.push(call.name.clone());
                observations.push(format!("[{}] {}", call.name, observation));
            }

            iterations.push(Iteration {
                number: iteration_num,
                thought: text,
                action: tool_names.join(", "),
                result: observations.join("\n"),
                timestamp: Utc::now(),
            });

            messages.push(ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text { text: observations.join("\n\n") }],
            });
        }

        Ok(AgentOutcome {
            final_output: ITERATION_LIMIT_MESSAGE.to_string(),
            iterations,
            tool_calls,
            sources,
            cost,
        })
    }
}

fn response_text(content: &[ContentPart]) -> String {
    content
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn nudge_message() -> ProviderMessage {
    ProviderMessage {
        role: Role::User,
        content: vec![ContentPart::Text {
            text: "You are approaching your token budget for this task. Produce your final \
                   answer now with <answer>...</answer>."
                .to_string(),
        }],
    }
}
