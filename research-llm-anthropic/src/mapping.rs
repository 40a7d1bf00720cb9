//! Request/response mapping between `research-llm`'s wire types and the
//! Anthropic Messages API format.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use research_llm::{ContentPart, ProviderError, ProviderMessage, ProviderRequest, ProviderResponse, Role, StopReason, TokenUsage, ToolSchema};

// ─── Request mapping ─────────────────────────────────────────────────────────

/// Convert a [`ProviderRequest`] into the Anthropic Messages API JSON body.
///
/// The returned value does **not** include `"stream"` — callers add that key.
#[must_use]
pub fn to_api_request(req: &ProviderRequest, default_model: &str) -> serde_json::Value {
    let model = req.model.clone().unwrap_or_else(|| default_model.to_string());

    let mut body = serde_json::json!({
        "model": model,
        "messages": map_messages(&req.messages),
        "max_tokens": req.max_tokens.unwrap_or(4096),
    });

    if let Some(system) = &req.system {
        body["system"] = serde_json::Value::String(system.clone());
    }

    if let Some(temp) = req.temperature {
        body["temperature"] = serde_json::Value::from(temp);
    }

    if !req.tools.is_empty() {
        body["tools"] = serde_json::Value::Array(req.tools.iter().map(map_tool_schema).collect());
    }

    // Merge extra provider-specific fields last (they can override anything above).
    if let serde_json::Value::Object(extra_map) = &req.extra
        && let serde_json::Value::Object(body_map) = &mut body
    {
        for (k, v) in extra_map {
            body_map.insert(k.clone(), v.clone());
        }
    }

    body
}

/// Map a list of [`ProviderMessage`]s to Anthropic's message array format.
///
/// Anthropic does not accept system messages inline — they go in the
/// top-level `system` field, so `Role::System` messages are dropped here;
/// callers are expected to have put system content into `req.system` instead.
fn map_messages(messages: &[ProviderMessage]) -> serde_json::Value {
    let arr: Vec<serde_json::Value> = messages
        .iter()
        .filter(|msg| msg.role != Role::System)
        .map(|msg| {
            let role_str = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => unreachable!("filtered above"),
            };
            serde_json::json!({ "role": role_str, "content": map_content_parts(&msg.content) })
        })
        .collect();
    serde_json::Value::Array(arr)
}

/// Map a slice of [`ContentPart`]s to Anthropic's content array.
pub(crate) fn map_content_parts(parts: &[ContentPart]) -> serde_json::Value {
    serde_json::Value::Array(parts.iter().map(map_content_part).collect())
}

/// Map a single [`ContentPart`] to its Anthropic JSON representation.
pub(crate) fn map_content_part(part: &ContentPart) -> serde_json::Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({
            "type": "text",
            "text": text,
        }),
        ContentPart::ToolUse { id, name, input } => serde_json::json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentPart::ToolResult { tool_use_id, content, is_error } => serde_json::json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error,
        }),
    }
}

/// Map a [`ToolSchema`] to Anthropic's tool definition format.
fn map_tool_schema(tool: &ToolSchema) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

// ─── Response mapping ─────────────────────────────────────────────────────────

/// Parse an Anthropic Messages API response JSON into a [`ProviderResponse`].
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] if required fields are missing or malformed.
pub fn from_api_response(body: &serde_json::Value) -> Result<ProviderResponse, ProviderError> {
    let model = body["model"]
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse("missing 'model' in response".into()))?
        .to_string();

    let content_arr = body["content"]
        .as_array()
        .ok_or_else(|| ProviderError::InvalidResponse("missing 'content' array in response".into()))?;

    let mut content = Vec::with_capacity(content_arr.len());
    for block in content_arr {
        content.push(parse_content_block(block)?);
    }

    let usage = parse_usage(&body["usage"]);

    let stop_reason = body["stop_reason"]
        .as_str()
        .map(parse_stop_reason)
        .unwrap_or(StopReason::EndTurn);

    let truncated = Some(stop_reason == StopReason::MaxTokens);

    Ok(ProviderResponse { content, stop_reason, usage, model, cost: None, truncated })
}

/// Parse a single content block from the Anthropic response JSON.
fn parse_content_block(block: &serde_json::Value) -> Result<ContentPart, ProviderError> {
    let block_type = block["type"]
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse("content block missing 'type'".into()))?;

    match block_type {
        "text" => {
            let text = block["text"]
                .as_str()
                .ok_or_else(|| ProviderError::InvalidResponse("text block missing 'text'".into()))?
                .to_string();
            Ok(ContentPart::Text { text })
        }
        "tool_use" => {
            let id = block["id"]
                .as_str()
                .ok_or_else(|| ProviderError::InvalidResponse("tool_use block missing 'id'".into()))?
                .to_string();
            let name = block["name"]
                .as_str()
                .ok_or_else(|| ProviderError::InvalidResponse("tool_use block missing 'name'".into()))?
                .to_string();
            let input = block["input"].clone();
            Ok(ContentPart::ToolUse { id, name, input })
        }
        other => Err(ProviderError::InvalidResponse(format!("unknown content block type: {other}"))),
    }
}

/// Parse [`TokenUsage`] from the Anthropic response `usage` field.
fn parse_usage(usage: &serde_json::Value) -> TokenUsage {
    TokenUsage {
        input_tokens: usage["input_tokens"].as_u64().unwrap_or(0),
        output_tokens: usage["output_tokens"].as_u64().unwrap_or(0),
        cache_read_tokens: usage["cache_read_input_tokens"].as_u64(),
        cache_creation_tokens: usage["cache_creation_input_tokens"].as_u64(),
    }
}

/// Map an Anthropic `stop_reason` string to a [`StopReason`].
pub(crate) fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "end_turn" | "stop_sequence" => StopReason::EndTurn,
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::ContentPart;
    use serde_json::json;

    fn msg(role: Role, text: &str) -> ProviderMessage {
        ProviderMessage { role, content: vec![ContentPart::Text { text: text.into() }] }
    }

    #[test]
    fn to_api_request_uses_default_model_when_unset() {
        let req = ProviderRequest {
            model: None,
            messages: vec![msg(Role::User, "hi")],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        };
        let body = to_api_request(&req, "claude-sonnet-4-20250514");
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 4096);
    }

    #[test]
    fn to_api_request_drops_system_messages_from_messages_array() {
        let req = ProviderRequest {
            model: Some("claude-haiku-4-5".into()),
            messages: vec![msg(Role::System, "be terse"), msg(Role::User, "hi")],
            tools: vec![],
            max_tokens: Some(100),
            temperature: None,
            system: Some("be terse".into()),
            extra: serde_json::Value::Null,
        };
        let body = to_api_request(&req, "default");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["system"], "be terse");
    }

    #[test]
    fn to_api_request_includes_tools() {
        let req = ProviderRequest {
            model: Some("m".into()),
            messages: vec![msg(Role::User, "hi")],
            tools: vec![ToolSchema {
                name: "search".into(),
                description: "search the web".into(),
                input_schema: json!({"type": "object"}),
            }],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        };
        let body = to_api_request(&req, "default");
        assert_eq!(body["tools"][0]["name"], "search");
    }

    #[test]
    fn to_api_request_merges_extra_last() {
        let req = ProviderRequest {
            model: Some("m".into()),
            messages: vec![msg(Role::User, "hi")],
            tools: vec![],
            max_tokens: Some(10),
            temperature: None,
            system: None,
            extra: json!({"max_tokens": 999}),
        };
        let body = to_api_request(&req, "default");
        assert_eq!(body["max_tokens"], 999);
    }

    #[test]
    fn from_api_response_parses_text() {
        let body = json!({
            "model": "claude-sonnet-4-20250514",
            "content": [{"type": "text", "text": "hello"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5},
        });
        let resp = from_api_response(&body).unwrap();
        assert_eq!(resp.model, "claude-sonnet-4-20250514");
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.input_tokens, 10);
        assert_eq!(resp.truncated, Some(false));
        match &resp.content[0] {
            ContentPart::Text { text } => assert_eq!(text, "hello"),
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn from_api_response_parses_tool_use() {
        let body = json!({
            "model": "m",
            "content": [{"type": "tool_use", "id": "tu_1", "name": "search", "input": {"query": "rust"}}],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 1, "output_tokens": 1},
        });
        let resp = from_api_response(&body).unwrap();
        assert_eq!(resp.stop_reason, StopReason::ToolUse);
        match &resp.content[0] {
            ContentPart::ToolUse { id, name, input } => {
                assert_eq!(id, "tu_1");
                assert_eq!(name, "search");
                assert_eq!(input["query"], "rust");
            }
            _ => panic!("expected tool_use part"),
        }
    }

    #[test]
    fn from_api_response_max_tokens_marks_truncated() {
        let body = json!({
            "model": "m",
            "content": [{"type": "text", "text": "partial"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 1, "output_tokens": 1},
        });
        let resp = from_api_response(&body).unwrap();
        assert_eq!(resp.truncated, Some(true));
    }

    #[test]
    fn from_api_response_missing_model_errors() {
        let body = json!({"content": [], "usage": {}});
        assert!(from_api_response(&body).is_err());
    }

    #[test]
    fn from_api_response_unknown_block_type_errors() {
        let body = json!({
            "model": "m",
            "content": [{"type": "image"}],
            "usage": {},
        });
        assert!(from_api_response(&body).is_err());
    }
}
