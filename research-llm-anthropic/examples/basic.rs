//! Basic usage of the Anthropic provider.
//!
//! Set ANTHROPIC_API_KEY in your environment and run:
//!   cargo run --example basic -p research-llm-anthropic

use research_llm::{ContentPart, Provider, ProviderMessage, ProviderRequest, Role};
use research_llm_anthropic::Anthropic;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .expect("ANTHROPIC_API_KEY environment variable must be set");

    let provider = Anthropic::new(api_key);

    let request = ProviderRequest {
        model: None, // use default
        messages: vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "Say hello in one sentence.".into() }],
        }],
        tools: vec![],
        max_tokens: Some(128),
        temperature: None,
        system: None,
        extra: serde_json::Value::Null,
    };

    let response = provider.complete(request).await?;
    println!("Response: {:?}", response.content);
    println!("Tokens: {} in / {} out", response.usage.input_tokens, response.usage.output_tokens);

    Ok(())
}
