//! Simple Tauri command handlers.
//!
//! These are thin wrappers that bridge frontend invoke() calls to Rust.
//! Each command does one thing: read state, write clipboard, save context.
//!
//! Multi-step commands live in pipeline.rs instead.

use crate::context;
use crate::llm;
use crate::ocr;

/// Tauri command: copy text to the system clipboard.
///
/// Uses arboard for native clipboard access — works reliably
/// unlike navigator.clipboard in webview windows.
#[tauri::command]
pub fn copy_to_clipboard(text: String) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(&text).map_err(|e| e.to_string())?;
    log::info!("[REPLY] Copied {} chars to clipboard", text.len());
    Ok(())
}

/// Tauri command: get the reconstructed transcript for the current session.
#[tauri::command]
pub fn get_transcript(state: tauri::State<'_, llm::ReplyState>) -> Result<String, String> {
    let guard = state.transcript.lock().map_err(|e| e.to_string())?;
    guard
        .clone()
        .ok_or("No transcript available".to_string())
}

/// Tauri command: replace the transcript with the user's edited version.
///
/// The transcript textarea is editable — corrections made there feed the
/// reply prompt instead of the raw reconstruction.
#[tauri::command]
pub fn set_transcript(
    state: tauri::State<'_, llm::ReplyState>,
    text: String,
) -> Result<(), String> {
    *state.transcript.lock().map_err(|e| e.to_string())? = Some(text);
    Ok(())
}

/// Tauri command: get the last generated reply.
#[tauri::command]
pub fn get_reply(state: tauri::State<'_, llm::ReplyState>) -> Result<String, String> {
    let guard = state.reply.lock().map_err(|e| e.to_string())?;
    guard.clone().ok_or("No reply available".to_string())
}

/// Tauri command: get the raw OCR result for the preview overlay.
#[tauri::command]
pub fn get_ocr_result(
    state: tauri::State<'_, llm::ReplyState>,
) -> Result<ocr::OcrResponse, String> {
    let guard = state.ocr.lock().map_err(|e| e.to_string())?;
    guard.clone().ok_or("No OCR result available".to_string())
}

/// Tauri command: load the saved background info.
#[tauri::command]
pub fn get_background_info() -> Result<Option<context::BackgroundInfo>, String> {
    Ok(context::load_background())
}

/// Tauri command: save the background info.
#[tauri::command]
pub fn save_background_info(content: String) -> Result<context::BackgroundInfo, String> {
    context::save_background(&content)
}

/// Tauri command: load contact info for the current session.
#[tauri::command]
pub fn get_contact_info(
    state: tauri::State<'_, llm::ReplyState>,
) -> Result<Option<context::ChatContext>, String> {
    let session_id = {
        let guard = state.session_id.lock().map_err(|e| e.to_string())?;
        guard.clone()
    };
    Ok(session_id.and_then(|id| context::load_chat_context(&id)))
}

/// Tauri command: save contact info for the current session.
#[tauri::command]
pub fn save_contact_info(
    state: tauri::State<'_, llm::ReplyState>,
    contact_name: String,
    contact_notes: String,
) -> Result<context::ChatContext, String> {
    let session_id = {
        let guard = state.session_id.lock().map_err(|e| e.to_string())?;
        guard
            .clone()
            .ok_or("No active session — process a screenshot first".to_string())?
    };
    context::save_chat_context(&session_id, &contact_name, &contact_notes)
}
