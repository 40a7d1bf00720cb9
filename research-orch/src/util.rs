//! Small helpers shared by the planner, synthesizer, and diffusion modules.

use research_llm::ContentPart;

/// Join every [`ContentPart::Text`] piece of a response into one string.
pub(crate) fn response_text(content: &[ContentPart]) -> String {
    content
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the first top-level JSON value from `text`, tolerating
/// surrounding prose or markdown fences a model might add despite being
/// told to respond with only JSON.
pub(crate) fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find(['{', '['])?;
    let end = trimmed.rfind(['}', ']'])?;
    if end < start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
