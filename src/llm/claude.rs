//! Anthropic Claude reply pipeline — streaming SSE.
//!
//! Streams the drafted reply and emits Tauri events as text arrives:
//! - "reply-delta" per text delta
//! - "reply-complete" with the full reply
//!
//! A non-streaming variant backs the integration tests and headless callers.

use tauri::Emitter;

use super::prompts::{CLAUDE_MODEL, MAX_TOKENS};
use crate::ocr::client::RetryPolicy;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Claude pricing (as of mid 2026): $3/M input, $15/M output.
const INPUT_COST_PER_MILLION: f64 = 3.0;
const OUTPUT_COST_PER_MILLION: f64 = 15.0;

/// Stream a reply from Claude, emitting deltas to the main window.
pub async fn generate_streaming(
    app: &tauri::AppHandle,
    prompt: &str,
) -> Result<String, String> {
    let api_key = api_key()?;

    log::info!("[LLM] Provider: claude (streaming)");
    log::info!("[LLM] Model: {}", CLAUDE_MODEL);

    let start = std::time::Instant::now();

    let client = reqwest::Client::new();
    let mut response = client
        .post(MESSAGES_URL)
        .header("x-api-key", &api_key)
        .header("anthropic-version", API_VERSION)
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": CLAUDE_MODEL,
            "max_tokens": MAX_TOKENS,
            "stream": true,
            "messages": [{"role": "user", "content": prompt}]
        }))
        .send()
        .await
        .map_err(|e| {
            log::error!("[LLM] HTTP request failed: {}", e);
            format!("Claude request failed: {}", e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("[LLM] API returned {}: {}", status, body);
        return Err(format!("Claude API returned {}", status));
    }

    log::info!("[LLM] TTFB: {}ms", start.elapsed().as_millis());

    let mut reply = String::new();
    let mut sse_buffer = String::new();
    let mut ttft_logged = false;
    let mut input_tokens: u64 = 0;

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

                let events = super::streaming::parse_sse_events(&mut sse_buffer);
                for (event_type, data) in events {
                    match event_type.as_str() {
                        "content_block_delta" => {
                            if let Some(text_delta) = extract_text_delta(&data) {
                                if !ttft_logged && !text_delta.is_empty() {
                                    log::info!("[LLM] TTFT: {}ms", start.elapsed().as_millis());
                                    ttft_logged = true;
                                }
                                reply.push_str(&text_delta);
                                let _ = app.emit("reply-delta", &text_delta);
                            }
                        }
                        "message_start" => {
                            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&data) {
                                if let Some(usage) = json.get("message").and_then(|m| m.get("usage")) {
                                    input_tokens = usage["input_tokens"].as_u64().unwrap_or(0);
                                    log::info!("[LLM] Input tokens: {}", input_tokens);
                                }
                            }
                        }
                        "message_delta" => {
                            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&data) {
                                if let Some(usage) = json.get("usage") {
                                    let output_tokens =
                                        usage["output_tokens"].as_u64().unwrap_or(0);
                                    log::info!("[LLM] Output tokens: {}", output_tokens);
                                    let cost = (input_tokens as f64 * INPUT_COST_PER_MILLION
                                        + output_tokens as f64 * OUTPUT_COST_PER_MILLION)
                                        / 1_000_000.0;
                                    log::info!("[LLM] Estimated cost: ${:.6}", cost);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("[LLM] Stream error: {}", e);
                break;
            }
        }
    }

    log::info!(
        "[LLM] Stream complete: {}ms, {} chars",
        start.elapsed().as_millis(),
        reply.len()
    );

    if reply.is_empty() {
        return Err("Claude returned an empty reply".to_string());
    }
    let _ = app.emit("reply-complete", &reply);
    Ok(reply)
}

/// Non-streaming reply, retried per policy. Used by integration tests and
/// headless callers that don't hold an app handle.
pub async fn generate(prompt: &str, retry: RetryPolicy) -> Result<String, String> {
    let api_key = api_key()?;

    let mut last_err = String::new();
    for attempt in 1..=retry.max_attempts.max(1) {
        match generate_once(&api_key, prompt).await {
            Ok(reply) => {
                if attempt > 1 {
                    log::info!("[LLM] Succeeded on attempt {}", attempt);
                }
                return Ok(reply);
            }
            Err(e) => {
                log::warn!("[LLM] Attempt {} failed: {}", attempt, e);
                last_err = e;
                if !retry.delay.is_zero() {
                    tokio::time::sleep(retry.delay).await;
                }
            }
        }
    }
    Err(last_err)
}

async fn generate_once(api_key: &str, prompt: &str) -> Result<String, String> {
    let start = std::time::Instant::now();
    let response = reqwest::Client::new()
        .post(MESSAGES_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": CLAUDE_MODEL,
            "max_tokens": MAX_TOKENS,
            "messages": [{"role": "user", "content": prompt}]
        }))
        .send()
        .await
        .map_err(|e| format!("Claude request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Claude API returned {}: {}", status, body));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Claude response decode failed: {}", e))?;

    log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());

    body["content"][0]["text"]
        .as_str()
        .map(|t| t.to_string())
        .ok_or_else(|| "No text content in Claude response".to_string())
}

fn api_key() -> Result<String, String> {
    match std::env::var("ANTHROPIC_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => {
            log::warn!("[LLM] No ANTHROPIC_API_KEY set");
            Err("No Anthropic API key configured. Add it in Settings.".to_string())
        }
    }
}

/// Extract the text delta from a content_block_delta SSE data payload.
fn extract_text_delta(data: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(data).ok()?;
    json["delta"]["text"].as_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_delta() {
        let data = r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"你好"}}"#;
        assert_eq!(extract_text_delta(data), Some("你好".to_string()));
    }

    #[test]
    fn ignores_non_text_delta() {
        assert_eq!(extract_text_delta(r#"{"delta":{"stop_reason":"end_turn"}}"#), None);
        assert_eq!(extract_text_delta("not json"), None);
    }
}
