//! DeepSeek reply pipeline — OpenAI-compatible chat completions, streaming.
//!
//! deepseek-reasoner interleaves `reasoning_content` deltas (chain of
//! thought) with `content` deltas (the actual reply). The reasoning stream
//! goes to the UI as "reply-reasoning" so it can render as a collapsible
//! thinking view; only `content` accumulates into the returned reply.

use tauri::Emitter;

use super::prompts::{DEEPSEEK_MODEL, DEEPSEEK_SYSTEM_PROMPT, MAX_TOKENS, TEMPERATURE};

const COMPLETIONS_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Stream a reply from DeepSeek, emitting deltas to the main window.
pub async fn generate_streaming(
    app: &tauri::AppHandle,
    prompt: &str,
) -> Result<String, String> {
    let api_key = api_key()?;

    log::info!("[LLM] Provider: deepseek (streaming)");
    log::info!("[LLM] Model: {}", DEEPSEEK_MODEL);

    let start = std::time::Instant::now();

    let client = reqwest::Client::new();
    let mut response = client
        .post(COMPLETIONS_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({
            "model": DEEPSEEK_MODEL,
            "stream": true,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {"role": "system", "content": DEEPSEEK_SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ]
        }))
        .send()
        .await
        .map_err(|e| {
            log::error!("[LLM] HTTP request failed: {}", e);
            format!("DeepSeek request failed: {}", e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("[LLM] API returned {}: {}", status, body);
        return Err(format!("DeepSeek API returned {}", status));
    }

    log::info!("[LLM] TTFB: {}ms", start.elapsed().as_millis());

    let mut reply = String::new();
    let mut sse_buffer = String::new();
    let mut ttft_logged = false;

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

                for data in super::streaming::parse_data_only_sse_events(&mut sse_buffer) {
                    let (content, reasoning) = extract_deltas(&data);
                    if let Some(reasoning) = reasoning {
                        let _ = app.emit("reply-reasoning", &reasoning);
                    }
                    if let Some(content) = content {
                        if !ttft_logged && !content.is_empty() {
                            log::info!("[LLM] TTFT: {}ms", start.elapsed().as_millis());
                            ttft_logged = true;
                        }
                        reply.push_str(&content);
                        let _ = app.emit("reply-delta", &content);
                    }
                    log_usage(&data);
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
        return Err("DeepSeek returned an empty reply".to_string());
    }
    let _ = app.emit("reply-complete", &reply);
    Ok(reply)
}

/// Non-streaming reply. Used by connection tests and headless callers.
pub async fn generate(prompt: &str) -> Result<String, String> {
    let api_key = api_key()?;
    let start = std::time::Instant::now();

    let response = reqwest::Client::new()
        .post(COMPLETIONS_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({
            "model": DEEPSEEK_MODEL,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {"role": "system", "content": DEEPSEEK_SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ]
        }))
        .send()
        .await
        .map_err(|e| format!("DeepSeek request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("DeepSeek API returned {}: {}", status, body));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("DeepSeek response decode failed: {}", e))?;

    log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());

    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|t| t.to_string())
        .ok_or_else(|| "No content in DeepSeek response".to_string())
}

fn api_key() -> Result<String, String> {
    match std::env::var("DEEPSEEK_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => {
            log::warn!("[LLM] No DEEPSEEK_API_KEY set");
            Err("No DeepSeek API key configured. Add it in Settings.".to_string())
        }
    }
}

/// Extract `(content, reasoning_content)` deltas from a stream chunk.
fn extract_deltas(data: &str) -> (Option<String>, Option<String>) {
    let json: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return (None, None),
    };
    let delta = &json["choices"][0]["delta"];
    (
        delta["content"].as_str().map(|s| s.to_string()),
        delta["reasoning_content"].as_str().map(|s| s.to_string()),
    )
}

/// Final stream chunk carries token usage; log it when present.
fn log_usage(data: &str) {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(data) {
        if let Some(usage) = json.get("usage").filter(|u| !u.is_null()) {
            log::info!(
                "[LLM] Input tokens: {}",
                usage["prompt_tokens"].as_u64().unwrap_or(0)
            );
            log::info!(
                "[LLM] Output tokens: {}",
                usage["completion_tokens"].as_u64().unwrap_or(0)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"好的"}}]}"#;
        assert_eq!(extract_deltas(data), (Some("好的".to_string()), None));
    }

    #[test]
    fn extracts_reasoning_delta() {
        let data = r#"{"choices":[{"delta":{"reasoning_content":"用户想要…"}}]}"#;
        assert_eq!(extract_deltas(data), (None, Some("用户想要…".to_string())));
    }

    #[test]
    fn tolerates_garbage() {
        assert_eq!(extract_deltas("nope"), (None, None));
    }
}
