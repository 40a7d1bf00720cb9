#![no_main]

use libfuzzer_sys::fuzz_target;
use research_llm_anthropic::from_api_response;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else { return };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else { return };
    let _ = from_api_response(&value);
});
