//! Integration test: a real Anthropic Haiku call through the full stack.

use research_llm::{ContentPart, Provider, ProviderRequest, Role, StopReason};
use research_llm_anthropic::Anthropic;

#[tokio::test]
#[ignore] // Requires ANTHROPIC_API_KEY environment variable
async fn real_haiku_simple_completion() {
    let api_key = std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY not set");
    let provider = Anthropic::new(api_key).model("claude-haiku-4-5");

    let request = ProviderRequest {
        model: None,
        messages: vec![research_llm::ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "Say hello in exactly 3 words.".into() }],
        }],
        tools: vec![],
        max_tokens: Some(128),
        temperature: None,
        system: Some("You are a helpful assistant. Be very concise.".into()),
        extra: serde_json::Value::Null,
    };

    let response = provider.complete(request).await.unwrap();

    assert!(matches!(response.stop_reason, StopReason::EndTurn | StopReason::MaxTokens));
    assert!(response.usage.input_tokens > 0);
    assert!(response.usage.output_tokens > 0);
    assert!(!response.content.is_empty());
}

#[tokio::test]
#[ignore] // Requires ANTHROPIC_API_KEY environment variable
async fn real_haiku_streaming_completion() {
    let api_key = std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY not set");
    let provider = Anthropic::new(api_key).model("claude-haiku-4-5");

    let request = ProviderRequest {
        model: None,
        messages: vec![research_llm::ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "Say hi.".into() }],
        }],
        tools: vec![],
        max_tokens: Some(64),
        temperature: None,
        system: None,
        extra: serde_json::Value::Null,
    };

    let mut text = String::new();
    let mut saw_done = false;
    provider
        .complete_stream(request, |event| match event {
            research_llm::StreamEvent::TextDelta { text: delta } => text.push_str(&delta),
            research_llm::StreamEvent::Done { .. } => saw_done = true,
            _ => {}
        })
        .await
        .unwrap();

    assert!(saw_done);
    assert!(!text.is_empty());
}
