//! Conversation context persistence.
//!
//! Two small JSON stores under `~/.config/reply-glass/`:
//! - `background.json` — free-form background info about the user, shared by
//!   every session.
//! - `context/{session_id}.json` — contact name + notes for one conversation.
//!
//! A session is identified by hashing the screenshot bytes, so re-uploading
//! the same conversation screenshot finds its saved contact notes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Free-form background info applied to every reply prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundInfo {
    pub content: String,
    pub updated_at: u64,
}

/// Per-conversation contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub session_id: String,
    pub contact_name: String,
    pub contact_notes: String,
    pub updated_at: u64,
}

fn store_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reply-glass")
}

fn background_path() -> PathBuf {
    store_dir().join("background.json")
}

fn context_path(session_id: &str) -> PathBuf {
    store_dir().join("context").join(format!("{}.json", session_id))
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Derive a stable session id from screenshot bytes.
pub fn session_id_for(image_bytes: &[u8]) -> String {
    let digest = Sha256::digest(image_bytes);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

/// Persist the background info, replacing any previous value.
pub fn save_background(content: &str) -> Result<BackgroundInfo, String> {
    let info = BackgroundInfo {
        content: content.to_string(),
        updated_at: now_epoch_secs(),
    };
    write_json(&background_path(), &info)?;
    log::info!("[CONTEXT] Saved background info ({} chars)", content.len());
    Ok(info)
}

/// Load the background info, if any was saved.
pub fn load_background() -> Option<BackgroundInfo> {
    read_json(&background_path())
}

/// Persist contact details for one conversation.
pub fn save_chat_context(
    session_id: &str,
    contact_name: &str,
    contact_notes: &str,
) -> Result<ChatContext, String> {
    let ctx = ChatContext {
        session_id: session_id.to_string(),
        contact_name: contact_name.to_string(),
        contact_notes: contact_notes.to_string(),
        updated_at: now_epoch_secs(),
    };
    write_json(&context_path(session_id), &ctx)?;
    log::info!("[CONTEXT] Saved chat context for session {}", session_id);
    Ok(ctx)
}

/// Load contact details for one conversation, if saved.
pub fn load_chat_context(session_id: &str) -> Option<ChatContext> {
    read_json(&context_path(session_id))
}

/// Render the `{background}` block for the reply prompt.
pub fn render_background(
    background: Option<&BackgroundInfo>,
    chat_context: Option<&ChatContext>,
) -> String {
    let mut out = String::new();
    if let Some(bg) = background {
        out.push_str(&format!("背景信息：{}\n", bg.content));
    }
    match chat_context {
        Some(ctx) => out.push_str(&format!(
            "聊天对象：{}\n备注：{}",
            ctx.contact_name, ctx.contact_notes
        )),
        None => out.push_str("未提供聊天对象信息"),
    }
    out
}

fn write_json<T: Serialize>(path: &PathBuf, value: &T) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create store dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &PathBuf) -> Option<T> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_stable_and_short() {
        let a = session_id_for(b"same bytes");
        let b = session_id_for(b"same bytes");
        let c = session_id_for(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn chat_context_roundtrip() {
        let session = format!("test-{}", session_id_for(b"context roundtrip"));
        save_chat_context(&session, "王经理", "部门负责人，喜欢简短的消息").unwrap();
        let loaded = load_chat_context(&session).expect("context should load back");
        assert_eq!(loaded.contact_name, "王经理");
        assert_eq!(loaded.contact_notes, "部门负责人，喜欢简短的消息");
        let _ = std::fs::remove_file(context_path(&session));
    }

    #[test]
    fn missing_context_is_none() {
        assert!(load_chat_context("no-such-session-xyz").is_none());
    }

    #[test]
    fn renders_full_background_block() {
        let bg = BackgroundInfo {
            content: "我在一家外贸公司做销售".to_string(),
            updated_at: 0,
        };
        let ctx = ChatContext {
            session_id: "s".to_string(),
            contact_name: "李总".to_string(),
            contact_notes: "重要客户".to_string(),
            updated_at: 0,
        };
        let rendered = render_background(Some(&bg), Some(&ctx));
        assert_eq!(
            rendered,
            "背景信息：我在一家外贸公司做销售\n聊天对象：李总\n备注：重要客户"
        );
    }

    #[test]
    fn renders_placeholder_without_contact() {
        assert_eq!(render_background(None, None), "未提供聊天对象信息");
    }
}
