//! SSE streaming support for the Anthropic Messages API.
//!
//! Parses the Server-Sent Events stream produced by Anthropic and invokes a
//! [`StreamHandler`] once per [`StreamEvent`].
//!
//! Reference: <https://docs.anthropic.com/en/api/messages-streaming>

use std::collections::HashMap;

use futures_util::StreamExt;
use reqwest::Response;
use research_llm::{ProviderError, StopReason, StreamEvent, StreamHandler, TokenUsage};

use crate::mapping::parse_stop_reason;

/// Consume `response`'s body as an SSE stream, calling `handler` once per
/// [`StreamEvent`] and returning once the stream ends or errors.
pub(crate) async fn drive_sse(
    response: Response,
    mut handler: impl StreamHandler,
) -> Result<(), ProviderError> {
    let mut state = SseParserState::new();
    let mut byte_stream = std::pin::pin!(response.bytes_stream());
    let mut line_buf = String::new();

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk =
            chunk_result.map_err(|e| ProviderError::RequestFailed(format!("stream read error: {e}")))?;
        let chunk_str = std::str::from_utf8(&chunk)
            .map_err(|e| ProviderError::InvalidResponse(format!("UTF-8 decode error: {e}")))?;
        line_buf.push_str(chunk_str);

        while let Some(newline_pos) = line_buf.find('\n') {
            let line = line_buf[..newline_pos].trim_end_matches('\r').to_string();
            line_buf.drain(..=newline_pos);
            for event in state.process_line(&line)? {
                handler(event);
            }
        }
    }

    if !line_buf.trim().is_empty() {
        for event in state.process_line(line_buf.trim())? {
            handler(event);
        }
    }

    Ok(())
}

/// Tracks in-progress streaming state across SSE events.
struct SseParserState {
    current_event_type: Option<String>,
    current_data: String,
    tool_uses: HashMap<usize, ToolUseInProgress>,
    usage: Option<TokenUsage>,
    stop_reason: Option<StopReason>,
}

struct ToolUseInProgress {
    id: String,
    name: String,
    name_sent: bool,
}

impl SseParserState {
    fn new() -> Self {
        Self {
            current_event_type: None,
            current_data: String::new(),
            tool_uses: HashMap::new(),
            usage: None,
            stop_reason: None,
        }
    }

    /// Process one SSE line and return any events it produces.
    fn process_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, ProviderError> {
        if line.is_empty() {
            return self.dispatch_event();
        }

        if let Some(event_type) = line.strip_prefix("event: ") {
            self.current_event_type = Some(event_type.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data: ") {
            if !self.current_data.is_empty() {
                self.current_data.push('\n');
            }
            self.current_data.push_str(data.trim());
        }
        // Comment lines (starting with ':') and other prefixes are ignored.

        Ok(vec![])
    }

    /// Dispatch the accumulated event type + data, returning produced [`StreamEvent`]s.
    fn dispatch_event(&mut self) -> Result<Vec<StreamEvent>, ProviderError> {
        let event_type = match self.current_event_type.take() {
            Some(t) => t,
            None => {
                self.current_data.clear();
                return Ok(vec![]);
            }
        };
        let data = std::mem::take(&mut self.current_data);

        if data == "[DONE]" || data.is_empty() {
            return Ok(vec![]);
        }

        let json: serde_json::Value = serde_json::from_str(&data)
            .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error in SSE: {e}")))?;

        Ok(match event_type.as_str() {
            "content_block_start" => self.handle_content_block_start(&json),
            "content_block_delta" => self.handle_content_block_delta(&json),
            "content_block_stop" => vec![],
            "message_delta" => self.handle_message_delta(&json),
            "message_stop" => self.handle_message_stop(),
            "message_start" | "ping" => vec![],
            "error" => {
                let msg = json["error"]["message"].as_str().unwrap_or("unknown streaming error");
                return Err(ProviderError::Other(Box::new(std::io::Error::other(msg.to_string()))));
            }
            _ => vec![],
        })
    }

    fn handle_content_block_start(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let block = &json["content_block"];
        if block["type"].as_str() == Some("tool_use") {
            let id = block["id"].as_str().unwrap_or("").to_string();
            let name = block["name"].as_str().unwrap_or("").to_string();
            self.tool_uses.insert(index, ToolUseInProgress { id, name, name_sent: false });
        }
        vec![]
    }

    fn handle_content_block_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let delta = &json["delta"];
        match delta["type"].as_str().unwrap_or("") {
            "text_delta" => {
                let text = delta["text"].as_str().unwrap_or("").to_string();
                vec![StreamEvent::TextDelta { text }]
            }
            "input_json_delta" => {
                let partial_json = delta["partial_json"].as_str().unwrap_or("").to_string();
                let Some(tool) = self.tool_uses.get_mut(&index) else {
                    return vec![];
                };
                let name = if tool.name_sent {
                    None
                } else {
                    tool.name_sent = true;
                    Some(tool.name.clone())
                };
                vec![StreamEvent::ToolUseDelta { id: tool.id.clone(), name, partial_json }]
            }
            _ => vec![],
        }
    }

    fn handle_message_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        if let Some(reason) = json["delta"]["stop_reason"].as_str() {
            self.stop_reason = Some(parse_stop_reason(reason));
        }
        if let Some(usage_val) = json.get("usage") {
            self.usage = Some(TokenUsage {
                input_tokens: usage_val["input_tokens"].as_u64().unwrap_or(0),
                output_tokens: usage_val["output_tokens"].as_u64().unwrap_or(0),
                cache_read_tokens: usage_val["cache_read_input_tokens"].as_u64(),
                cache_creation_tokens: usage_val["cache_creation_input_tokens"].as_u64(),
            });
        }
        vec![]
    }

    fn handle_message_stop(&mut self) -> Vec<StreamEvent> {
        vec![StreamEvent::Done {
            stop_reason: self.stop_reason.take().unwrap_or(StopReason::EndTurn),
            usage: self.usage.take(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(state: &mut SseParserState, text: &str) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        for line in text.split('\n') {
            out.extend(state.process_line(line).unwrap());
        }
        out
    }

    #[test]
    fn text_delta_round_trip() {
        let mut state = SseParserState::new();
        let events = lines(
            &mut state,
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n",
        );
        assert_eq!(events, vec![StreamEvent::TextDelta { text: "Hi".into() }]);
    }

    #[test]
    fn tool_use_first_delta_carries_name_then_omits_it() {
        let mut state = SseParserState::new();
        lines(
            &mut state,
            "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"tool_use\",\"id\":\"tu_1\",\"name\":\"search\"}}\n",
        );
        let first = lines(
            &mut state,
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"q\\\"\"}}\n",
        );
        assert_eq!(
            first,
            vec![StreamEvent::ToolUseDelta {
                id: "tu_1".into(),
                name: Some("search".into()),
                partial_json: "{\"q\"".into(),
            }]
        );
        let second = lines(
            &mut state,
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\":1}\"}}\n",
        );
        assert_eq!(
            second,
            vec![StreamEvent::ToolUseDelta {
                id: "tu_1".into(),
                name: None,
                partial_json: ":1}".into(),
            }]
        );
    }

    #[test]
    fn message_stop_emits_done_with_usage_and_stop_reason() {
        let mut state = SseParserState::new();
        lines(
            &mut state,
            "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":12}}\n",
        );
        let events = lines(&mut state, "event: message_stop\ndata: {\"type\":\"message_stop\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Done {
                stop_reason: StopReason::EndTurn,
                usage: Some(TokenUsage { input_tokens: 0, output_tokens: 12, ..Default::default() }),
            }]
        );
    }

    #[test]
    fn ping_and_message_start_produce_no_events() {
        let mut state = SseParserState::new();
        assert!(lines(&mut state, "event: ping\ndata: {}\n").is_empty());
        assert!(lines(&mut state, "event: message_start\ndata: {\"type\":\"message_start\"}\n").is_empty());
    }

    #[test]
    fn done_sentinel_and_empty_data_produce_no_events() {
        let mut state = SseParserState::new();
        assert!(lines(&mut state, "event: content_block_delta\ndata: [DONE]\n").is_empty());
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let mut state = SseParserState::new();
        assert!(lines(&mut state, "event: some_future_event\ndata: {}\n").is_empty());
    }

    #[test]
    fn error_event_returns_err() {
        let mut state = SseParserState::new();
        let err = state
            .process_line("event: error")
            .unwrap()
            .is_empty();
        assert!(err);
        let result = state.process_line("data: {\"error\":{\"message\":\"overloaded\"}}").unwrap();
        assert!(result.is_empty());
        let dispatched = state.process_line("");
        assert!(dispatched.is_err());
    }

    #[test]
    fn malformed_json_returns_err() {
        let mut state = SseParserState::new();
        state.process_line("event: content_block_delta").unwrap();
        state.process_line("data: {not json}").unwrap();
        assert!(state.process_line("").is_err());
    }

    #[test]
    fn split_line_across_chunks_still_parses() {
        let mut state = SseParserState::new();
        let mut events = Vec::new();
        events.extend(state.process_line("event: content_block_delta").unwrap());
        events.extend(
            state
                .process_line("data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"ok\"}}")
                .unwrap(),
        );
        events.extend(state.process_line("").unwrap());
        assert_eq!(events, vec![StreamEvent::TextDelta { text: "ok".into() }]);
    }
}
