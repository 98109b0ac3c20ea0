//! Dify workflow reply pipeline — file upload + streaming workflow run.
//!
//! Unlike the chat-completion providers, Dify consumes the screenshot itself:
//! upload the image, then run the configured workflow against the uploaded
//! file. The workflow's text chunks stream back as "reply-delta" events.

use tauri::Emitter;

const UPLOAD_URL: &str = "https://api.dify.ai/v1/files/upload";
const WORKFLOW_URL: &str = "https://api.dify.ai/v1/workflows/run";

/// Upload the screenshot; returns the Dify file id.
pub async fn upload_image(png_bytes: Vec<u8>, user: &str) -> Result<String, String> {
    let api_key = api_key()?;

    log::info!(
        "[DIFY] Uploading image for user {}: {} bytes",
        user,
        png_bytes.len()
    );

    let part = reqwest::multipart::Part::bytes(png_bytes)
        .file_name("screenshot.png")
        .mime_str("image/png")
        .map_err(|e| format!("Dify upload part failed: {}", e))?;
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("user", user.to_string());

    let response = reqwest::Client::new()
        .post(UPLOAD_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("Dify upload failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("[DIFY] File upload failed: {} {}", status, body);
        return Err(format!("Dify upload returned {}", status));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Dify upload decode failed: {}", e))?;

    let file_id = body["id"]
        .as_str()
        .ok_or_else(|| "No file id in Dify upload response".to_string())?
        .to_string();
    log::info!("[DIFY] File upload successful: {}", file_id);
    Ok(file_id)
}

/// Run the workflow on an uploaded file, streaming text chunks to the UI.
pub async fn run_workflow(
    app: &tauri::AppHandle,
    file_id: &str,
    user: &str,
) -> Result<String, String> {
    let api_key = api_key()?;

    log::info!("[DIFY] Starting workflow for file {}", file_id);
    let start = std::time::Instant::now();

    let mut response = reqwest::Client::new()
        .post(WORKFLOW_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({
            "inputs": {},
            "files": [{
                "transfer_method": "local_file",
                "upload_file_id": file_id,
                "type": "image"
            }],
            "response_mode": "streaming",
            "user": user
        }))
        .send()
        .await
        .map_err(|e| format!("Dify workflow request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("[DIFY] Workflow request failed: {} {}", status, body);
        return Err(format!("Dify workflow returned {}", status));
    }

    let mut reply = String::new();
    let mut sse_buffer = String::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

                for data in super::streaming::parse_data_only_sse_events(&mut sse_buffer) {
                    match parse_workflow_event(&data) {
                        WorkflowEvent::TextChunk(text) => {
                            reply.push_str(&text);
                            let _ = app.emit("reply-delta", &text);
                        }
                        WorkflowEvent::Finished(outputs) => {
                            log::info!(
                                "[DIFY] Workflow finished in {}ms",
                                start.elapsed().as_millis()
                            );
                            // Some workflows only report text in the final
                            // outputs, without chunking along the way.
                            if reply.is_empty() {
                                if let Some(text) = outputs {
                                    reply = text;
                                }
                            }
                        }
                        WorkflowEvent::Other => {}
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("[DIFY] Stream error: {}", e);
                break;
            }
        }
    }

    if reply.is_empty() {
        return Err("Dify workflow produced no text".to_string());
    }
    let _ = app.emit("reply-complete", &reply);
    Ok(reply)
}

fn api_key() -> Result<String, String> {
    match std::env::var("DIFY_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => {
            log::warn!("[DIFY] No DIFY_API_KEY set");
            Err("No Dify API key configured. Add it in Settings.".to_string())
        }
    }
}

enum WorkflowEvent {
    TextChunk(String),
    Finished(Option<String>),
    Other,
}

fn parse_workflow_event(data: &str) -> WorkflowEvent {
    let json: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return WorkflowEvent::Other,
    };
    match json["event"].as_str() {
        Some("text_chunk") => json["data"]["text"]
            .as_str()
            .map(|t| WorkflowEvent::TextChunk(t.to_string()))
            .unwrap_or(WorkflowEvent::Other),
        Some("workflow_finished") => {
            let outputs = &json["data"]["outputs"];
            let text = outputs
                .as_object()
                .and_then(|map| map.values().find_map(|v| v.as_str()))
                .map(|t| t.to_string());
            WorkflowEvent::Finished(text)
        }
        _ => WorkflowEvent::Other,
    }
}
