//! Text-tag parsing for the ReAct agent's tool-call and answer protocol.
//!
//! The agent does not rely on the provider's native structured tool-calling;
//! the system prompt instructs the model to emit `<tool name="...">{json}</tool>`
//! and `<answer>...</answer>` tags in plain text, and this module extracts them.

/// One tool invocation parsed from a model response, before its JSON
/// arguments are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToolCall {
    /// Tool name from the `name` attribute.
    pub name: String,
    /// Raw JSON text between the tags, not yet parsed.
    pub raw_args: String,
}

/// Parse every `<tool name="X">{json}</tool>` occurrence, in order.
pub fn parse_tool_calls(text: &str) -> Vec<ParsedToolCall> {
    const OPEN: &str = "<tool name=\"";
    const CLOSE: &str = "</tool>";

    let mut calls = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(name_end) = after_open.find('"') else { break };
        let name = after_open[..name_end].to_string();

        let after_name = &after_open[name_end..];
        let Some(tag_close) = after_name.find('>') else { break };
        let body = &after_name[tag_close + 1..];

        let Some(body_end) = body.find(CLOSE) else { break };
        let raw_args = body[..body_end].trim().to_string();
        calls.push(ParsedToolCall { name, raw_args });
        rest = &body[body_end + CLOSE.len()..];
    }
    calls
}

/// Extract the first `<answer>...</answer>` tag's body, if any.
///
/// A response with multiple `<answer>` tags is malformed; the first one
/// wins rather than raising an error.
pub fn parse_answer(text: &str) -> Option<String> {
    const OPEN: &str = "<answer>";
    const CLOSE: &str = "</answer>";

    let start = text.find(OPEN)?;
    let body = &text[start + OPEN.len()..];
    let end = body.find(CLOSE)?;
    Some(body[..end].trim().to_string())
}

/// Extract `http(s)://` URLs referenced in tool observation text, for
/// accumulation into a session's source list.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for scheme in ["https://", "http://"] {
        let mut rest = text;
        while let Some(pos) = rest.find(scheme) {
            let candidate = &rest[pos..];
            let end = candidate
                .find(|c: char| c.is_whitespace() || matches!(c, '"' | '<' | '>' | '(' | ')'))
                .unwrap_or(candidate.len());
            let url = candidate[..end].trim_end_matches(['.', ',']).to_string();
            if !url.is_empty() && url != scheme {
                urls.push(url);
            }
            let advance = end.max(scheme.len());
            rest = &candidate[advance..];
        }
    }
    urls
}
