//! Streaming example: real-time token output from Anthropic.
//!
//! Set ANTHROPIC_API_KEY in your environment and run:
//!   cargo run --example streaming -p research-llm-anthropic

use research_llm::{ContentPart, Provider, ProviderMessage, ProviderRequest, Role, StreamEvent};
use research_llm_anthropic::Anthropic;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .expect("ANTHROPIC_API_KEY environment variable must be set");

    let provider = Anthropic::new(api_key);

    let request = ProviderRequest {
        model: None,
        messages: vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "Write a haiku about Rust programming.".into() }],
        }],
        tools: vec![],
        max_tokens: Some(256),
        temperature: None,
        system: None,
        extra: serde_json::Value::Null,
    };

    print!("Streaming: ");
    std::io::stdout().flush()?;

    provider
        .complete_stream(request, |event| match event {
            StreamEvent::TextDelta { text } => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            StreamEvent::ToolUseDelta { .. } => {}
            StreamEvent::Done { usage, .. } => {
                println!();
                if let Some(usage) = usage {
                    println!("Token usage: {} input, {} output", usage.input_tokens, usage.output_tokens);
                }
                println!("Stream complete.");
            }
        })
        .await?;

    Ok(())
}
