//! LLM domain — multi-provider reply generation.
//!
//! Public API for the reply layer. External code should only use what is
//! exported here.
//!
//! Providers:
//!   - Anthropic Claude (claude.rs)
//!   - DeepSeek Reasoner (deepseek.rs)
//!   - Dify workflow (dify.rs)
//!
//! Shared:
//!   - streaming.rs — SSE frame parsing
//!   - provider.rs  — provider metadata + configuration checks
//!   - prompts.rs   — reply template + rendering

pub mod claude;
pub mod deepseek;
pub mod dify;
pub mod prompts;
pub mod provider;
pub mod streaming;

use std::sync::Mutex;

use crate::ocr::OcrResponse;

/// Thread-safe storage for the current screenshot session.
/// Written by process_screenshot, read by generate_reply and the thin
/// state-query commands.
pub struct ReplyState {
    /// Raw OCR result — kept for the preview overlay and debugging.
    pub ocr: Mutex<Option<OcrResponse>>,
    /// Reconstructed (possibly user-edited) transcript.
    pub transcript: Mutex<Option<String>>,
    /// The last generated reply.
    pub reply: Mutex<Option<String>>,
    /// Prepared screenshot bytes — Dify uploads these.
    pub screenshot: Mutex<Option<Vec<u8>>>,
    /// Stable id derived from the screenshot; keys the contact-notes store.
    pub session_id: Mutex<Option<String>>,
}

impl ReplyState {
    pub fn new() -> Self {
        Self {
            ocr: Mutex::new(None),
            transcript: Mutex::new(None),
            reply: Mutex::new(None),
            screenshot: Mutex::new(None),
            session_id: Mutex::new(None),
        }
    }
}
