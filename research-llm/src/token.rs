//! Deterministic token count estimation.
//!
//! This is a heuristic estimator, not a real tokenizer — real tokenization
//! varies per model and vendor. The default ratio of 4.0 chars/token
//! approximates GPT-family and Claude models closely enough for budget
//! tracking and context-window checks.

use crate::types::{ContentPart, ProviderMessage};

/// Estimates token counts from text using a configurable chars-per-token ratio.
///
/// # Example
///
/// ```
/// use research_llm::TokenCounter;
///
/// let counter = TokenCounter::new();
/// assert_eq!(counter.count_tokens(""), 0);
/// assert!(counter.count_tokens("hello world") > 0);
/// ```
pub struct TokenCounter {
    chars_per_token: f32,
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter {
    /// Create a counter with the default ratio of 4.0 chars/token.
    pub fn new() -> Self {
        Self { chars_per_token: 4.0 }
    }

    /// Create a counter with a custom chars-per-token ratio.
    pub fn with_ratio(chars_per_token: f32) -> Self {
        Self { chars_per_token }
    }

    /// Deterministic tokenization estimate for a piece of text.
    ///
    /// Returns 0 for empty input and never fails.
    pub fn count_tokens(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        (text.len() as f32 / self.chars_per_token).ceil() as u64
    }

    /// Estimate the total token count across a list of messages.
    pub fn count_messages(&self, messages: &[ProviderMessage]) -> u64 {
        messages.iter().map(|m| self.count_message(m)).sum()
    }

    fn count_message(&self, message: &ProviderMessage) -> u64 {
        // Small fixed overhead per message for role markers / formatting.
        const ROLE_OVERHEAD: u64 = 4;
        let content_tokens: u64 = message.content.iter().map(|part| self.count_part(part)).sum();
        ROLE_OVERHEAD + content_tokens
    }

    fn count_part(&self, part: &ContentPart) -> u64 {
        match part {
            ContentPart::Text { text } => self.count_tokens(text),
            ContentPart::ToolUse { name, input, .. } => {
                self.count_tokens(name) + self.count_tokens(&input.to_string())
            }
            ContentPart::ToolResult { content, .. } => self.count_tokens(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn empty_text_is_zero_tokens() {
        assert_eq!(TokenCounter::new().count_tokens(""), 0);
    }

    #[test]
    fn count_tokens_rounds_up() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count_tokens("ab"), 1); // 2 chars / 4.0 -> ceil(0.5) = 1
        assert_eq!(counter.count_tokens(&"a".repeat(400)), 100);
    }

    #[test]
    fn custom_ratio_changes_estimate() {
        let counter = TokenCounter::with_ratio(2.0);
        assert_eq!(counter.count_tokens(&"a".repeat(400)), 200);
    }

    #[test]
    fn count_messages_sums_parts_plus_overhead() {
        let counter = TokenCounter::new();
        let messages = vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "a".repeat(400) }],
        }];
        assert_eq!(counter.count_messages(&messages), 4 + 100);
    }

    #[test]
    fn count_tool_use_includes_name_and_input() {
        let counter = TokenCounter::new();
        let part = ContentPart::ToolUse {
            id: "tu_1".into(),
            name: "search".into(),
            input: serde_json::json!({"query": "rust"}),
        };
        assert!(counter.count_part(&part) > 0);
    }
}
