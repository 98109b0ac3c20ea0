//! Core screenshot-to-reply pipeline commands.
//!
//! These are the multi-step orchestration commands:
//! - process_screenshot: intake → prepare → cloud OCR → transcript
//! - generate_reply: transcript + context → prompt → stream provider reply

use serde::Serialize;
use tauri::Emitter;

use crate::context;
use crate::llm;
use crate::ocr;
use crate::ocr::client::{OcrClient, OcrError};
use crate::ocr::transcript::PARSE_FAILED_RETRY;
use crate::settings_commands::{ensure_ocr_credentials, resolve_provider};

/// Payload for the "transcript-complete" event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptReady {
    pub transcript: String,
    pub session_id: String,
    pub words_count: u64,
}

/// Tauri command: run a screenshot through intake → OCR → reconstruction.
///
/// `path` is the file chosen in the native dialog; with no path the image is
/// read from the system clipboard (paste flow). Returns the transcript and
/// emits "transcript-complete" for the main window.
#[tauri::command]
pub async fn process_screenshot(
    app: tauri::AppHandle,
    state: tauri::State<'_, llm::ReplyState>,
    path: Option<String>,
) -> Result<String, String> {
    let pipeline_start = std::time::Instant::now();

    // Stage 1: intake
    let raw_bytes = match &path {
        Some(p) => {
            log::info!("[INTAKE] Reading screenshot from {}", p);
            std::fs::read(p).map_err(|e| format!("Failed to read image: {}", e))?
        }
        None => {
            log::info!("[INTAKE] Reading screenshot from clipboard");
            read_clipboard_image()?
        }
    };

    // Stage 2: prepare for upload
    let prepare_start = std::time::Instant::now();
    let prepared = ocr::image_prep::prepare_for_ocr(&raw_bytes)
        .map_err(|e| format!("Not a usable image: {}", e))?;
    let prepare_ms = prepare_start.elapsed().as_millis();
    log::info!("[INTAKE] Prepared {} bytes in {}ms", prepared.len(), prepare_ms);

    let session_id = context::session_id_for(&prepared);

    // Stage 3: cloud OCR
    if !ensure_ocr_credentials() {
        return Err("OCR credentials not configured. Add them in Settings.".to_string());
    }
    let ocr_start = std::time::Instant::now();
    let client = OcrClient::from_env().map_err(|e| e.to_string())?;
    let ocr_result = client.recognize(&prepared).await.map_err(|e| match e {
        OcrError::MissingCredentials => {
            "OCR credentials not configured. Add them in Settings.".to_string()
        }
        other => {
            log::error!("[OCR] Recognition failed: {}", other);
            format!("图片识别失败：{}", other)
        }
    })?;
    let ocr_ms = ocr_start.elapsed().as_millis();
    log::info!(
        "[OCR] {} fragments in {}ms (log_id {})",
        ocr_result.words_result.len(),
        ocr_ms,
        ocr_result.log_id
    );

    // Stage 4: transcript reconstruction. The reconstructor itself is total;
    // the opaque retry message only covers state-poisoning style surprises.
    let transcript = ocr::transcript::reconstruct(&ocr_result);
    let words_count = ocr_result.words_result.len() as u64;
    {
        *state.ocr.lock().map_err(|_| PARSE_FAILED_RETRY.to_string())? = Some(ocr_result);
        *state.transcript.lock().map_err(|_| PARSE_FAILED_RETRY.to_string())? =
            Some(transcript.clone());
        *state.screenshot.lock().map_err(|_| PARSE_FAILED_RETRY.to_string())? = Some(prepared);
        *state.session_id.lock().map_err(|_| PARSE_FAILED_RETRY.to_string())? =
            Some(session_id.clone());
        *state.reply.lock().map_err(|_| PARSE_FAILED_RETRY.to_string())? = None;
    }

    let payload = TranscriptReady {
        transcript: transcript.clone(),
        session_id,
        words_count,
    };
    let _ = app.emit("transcript-complete", &payload);

    log::info!(
        "[PIPELINE] Screenshot processed in {}ms (prepare={} + ocr={})",
        pipeline_start.elapsed().as_millis(),
        prepare_ms,
        ocr_ms
    );
    Ok(transcript)
}

/// Tauri command: draft a reply for the current transcript.
///
/// Streams through the active provider; "reply-delta" events arrive while
/// this resolves with the full reply. `prompt_template` overrides the default
/// template when the user edited it in the prompt editor.
#[tauri::command]
pub async fn generate_reply(
    app: tauri::AppHandle,
    state: tauri::State<'_, llm::ReplyState>,
    prompt_template: Option<String>,
) -> Result<String, String> {
    let transcript = {
        let guard = state.transcript.lock().map_err(|e| e.to_string())?;
        guard
            .clone()
            .ok_or("No transcript available — process a screenshot first".to_string())?
    };
    let session_id = {
        let guard = state.session_id.lock().map_err(|e| e.to_string())?;
        guard.clone().unwrap_or_default()
    };

    let background_info = context::load_background();
    let chat_context = if session_id.is_empty() {
        None
    } else {
        context::load_chat_context(&session_id)
    };
    let background = context::render_background(background_info.as_ref(), chat_context.as_ref());

    let template = prompt_template
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| llm::prompts::REPLY_GENERATION_PROMPT.to_string());
    let prompt = llm::prompts::build_reply_prompt(&template, &transcript, &background);

    let provider = resolve_provider();
    log::info!("[PIPELINE] Generating reply via {}", provider);
    let start = std::time::Instant::now();

    let reply = match provider.as_str() {
        "deepseek" => llm::deepseek::generate_streaming(&app, &prompt).await?,
        "dify" => {
            // Dify consumes the screenshot itself, not the transcript.
            let screenshot = {
                let guard = state.screenshot.lock().map_err(|e| e.to_string())?;
                guard
                    .clone()
                    .ok_or("No screenshot available — process one first".to_string())?
            };
            let user = if session_id.is_empty() {
                "reply-glass".to_string()
            } else {
                session_id.clone()
            };
            let file_id = llm::dify::upload_image(screenshot, &user).await?;
            llm::dify::run_workflow(&app, &file_id, &user).await?
        }
        _ => llm::claude::generate_streaming(&app, &prompt).await?,
    };

    log::info!(
        "[PIPELINE] Reply generated in {}ms ({} chars)",
        start.elapsed().as_millis(),
        reply.len()
    );

    *state.reply.lock().map_err(|e| e.to_string())? = Some(reply.clone());
    Ok(reply)
}

/// Read an image off the system clipboard and encode it as PNG bytes.
fn read_clipboard_image() -> Result<Vec<u8>, String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    let img = clipboard
        .get_image()
        .map_err(|_| "No image on the clipboard".to_string())?;
    ocr::image_prep::rgba_to_png(&img.bytes, img.width as u32, img.height as u32)
        .map_err(|e| format!("Clipboard image decode failed: {}", e))
}
