//! Settings panel Tauri commands and provider resolution.
//!
//! Handles:
//! - Provider configuration (get/set active provider, save API keys)
//! - API key storage (OS keychain via keyring crate + env var)
//! - OCR credential storage and lookup
//! - Provider connection testing
//! - Settings window lifecycle

use tauri::Manager;

use crate::llm;

const KEYRING_SERVICE: &str = "reply-glass";

// ── Provider resolution ──────────────────────────────────────────────

/// Determine which reply provider to use.
///
/// Priority:
/// 1. LLM_PROVIDER env var (explicit override: "claude", "deepseek", "dify")
/// 2. First provider with an API key set (env var or keychain)
/// 3. "claude" as final default
pub fn resolve_provider() -> String {
    if let Ok(p) = std::env::var("LLM_PROVIDER") {
        let p = p.to_lowercase();
        if matches!(p.as_str(), "claude" | "deepseek" | "dify") {
            log::info!("[LLM] Provider override: {}", p);
            return p;
        }
    }

    for id in ["claude", "deepseek", "dify"] {
        if has_api_key(id) {
            return id.to_string();
        }
    }

    // Default (the key check in the provider will surface the setup error)
    "claude".to_string()
}

/// Check if a provider has an API key available (env var or keychain).
/// If found in keychain but not in env, loads it into env for the provider
/// functions to use.
fn has_api_key(provider_id: &str) -> bool {
    let env_key = match provider_id {
        "claude" => "ANTHROPIC_API_KEY",
        "deepseek" => "DEEPSEEK_API_KEY",
        "dify" => "DIFY_API_KEY",
        _ => return false,
    };
    load_secret(provider_id, env_key)
}

/// Make sure the OCR key pair is in the environment, pulling from the OS
/// keychain when needed. Returns false if either half is missing.
pub fn ensure_ocr_credentials() -> bool {
    let api = load_secret("baidu-ocr-key", "BAIDU_API_KEY");
    let secret = load_secret("baidu-ocr-secret", "BAIDU_SECRET_KEY");
    api && secret
}

/// Env-first secret lookup with keychain fallback.
fn load_secret(account: &str, env_key: &str) -> bool {
    if std::env::var(env_key).map(|k| !k.is_empty()).unwrap_or(false) {
        return true;
    }
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, account) {
        if let Ok(value) = entry.get_password() {
            if !value.is_empty() {
                std::env::set_var(env_key, &value);
                log::info!("[SETTINGS] Loaded {} from OS keychain", account);
                return true;
            }
        }
    }
    false
}

fn store_secret(account: &str, env_key: &str, value: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(value)
        .map_err(|e| format!("Failed to save key: {}", e))?;
    // Also set as env var so the current session picks it up immediately
    std::env::set_var(env_key, value);
    Ok(())
}

// ── Tauri commands ───────────────────────────────────────────────────

/// Tauri command: get provider configuration for the settings panel.
#[tauri::command]
pub fn get_provider_config() -> Result<serde_json::Value, String> {
    let providers = llm::provider::all_providers();
    let active = resolve_provider();
    let configured: Vec<String> = providers
        .iter()
        .filter(|p| llm::provider::is_provider_configured(&p.id))
        .map(|p| p.id.clone())
        .collect();

    Ok(serde_json::json!({
        "activeProvider": active,
        "providers": providers,
        "configuredProviders": configured,
        "ocrConfigured": ensure_ocr_credentials(),
    }))
}

/// Tauri command: set the active reply provider.
#[tauri::command]
pub fn set_active_provider(provider_id: String) -> Result<(), String> {
    if !matches!(provider_id.as_str(), "claude" | "deepseek" | "dify") {
        return Err(format!("Unknown provider: {}", provider_id));
    }
    std::env::set_var("LLM_PROVIDER", &provider_id);
    log::info!("[SETTINGS] Active provider set to: {}", provider_id);
    Ok(())
}

/// Tauri command: save a provider API key to the OS keychain.
#[tauri::command]
pub fn save_api_key(provider_id: String, api_key: String) -> Result<(), String> {
    let env_key = match provider_id.as_str() {
        "claude" => "ANTHROPIC_API_KEY",
        "deepseek" => "DEEPSEEK_API_KEY",
        "dify" => "DIFY_API_KEY",
        _ => return Err(format!("Unknown provider: {}", provider_id)),
    };
    store_secret(&provider_id, env_key, &api_key)?;
    log::info!("[SETTINGS] API key saved for provider: {}", provider_id);
    Ok(())
}

/// Tauri command: save the OCR provider key pair to the OS keychain.
#[tauri::command]
pub fn save_ocr_credentials(api_key: String, secret_key: String) -> Result<(), String> {
    store_secret("baidu-ocr-key", "BAIDU_API_KEY", &api_key)?;
    store_secret("baidu-ocr-secret", "BAIDU_SECRET_KEY", &secret_key)?;
    log::info!("[SETTINGS] OCR credentials saved");
    Ok(())
}

/// Tauri command: test a provider's API connection.
///
/// Sends a minimal request and checks for a valid response.
#[tauri::command]
pub async fn test_provider(provider_id: String) -> Result<bool, String> {
    let client = reqwest::Client::new();
    let request = match provider_id.as_str() {
        "claude" => {
            let key = std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| "No ANTHROPIC_API_KEY set".to_string())?;
            client
                .post("https://api.anthropic.com/v1/messages")
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&serde_json::json!({
                    "model": llm::prompts::CLAUDE_MODEL,
                    "max_tokens": 50,
                    "messages": [{"role": "user", "content": "Reply with just: ok"}]
                }))
        }
        "deepseek" => {
            let key = std::env::var("DEEPSEEK_API_KEY")
                .map_err(|_| "No DEEPSEEK_API_KEY set".to_string())?;
            client
                .post("https://api.deepseek.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", key))
                .header("Content-Type", "application/json")
                .json(&serde_json::json!({
                    "model": llm::prompts::DEEPSEEK_MODEL,
                    "max_tokens": 50,
                    "messages": [{"role": "user", "content": "Reply with just: ok"}]
                }))
        }
        "dify" => {
            let key = std::env::var("DIFY_API_KEY")
                .map_err(|_| "No DIFY_API_KEY set".to_string())?;
            client
                .get("https://api.dify.ai/v1/parameters")
                .header("Authorization", format!("Bearer {}", key))
        }
        _ => return Err(format!("Unknown provider: {}", provider_id)),
    };

    let resp = request.send().await.map_err(|e| e.to_string())?;
    let ok = resp.status().is_success();
    log::info!("[SETTINGS] Test {} — status: {}", provider_id, resp.status());
    Ok(ok)
}

/// Tauri command: close the settings window.
#[tauri::command]
pub fn close_settings(app: tauri::AppHandle) -> Result<(), String> {
    if let Some(window) = app.get_webview_window("settings") {
        window.close().map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Tauri command: open (or focus) the settings window.
#[tauri::command]
pub fn open_settings(app: tauri::AppHandle) -> Result<(), String> {
    if let Some(window) = app.get_webview_window("settings") {
        let _ = window.set_focus();
        return Ok(());
    }

    tauri::WebviewWindowBuilder::new(
        &app,
        "settings",
        tauri::WebviewUrl::App("settings.html".into()),
    )
    .title("Reply Glass 设置")
    .inner_size(520.0, 560.0)
    .resizable(true)
    .build()
    .map_err(|e| format!("Failed to create settings window: {}", e))?;

    Ok(())
}
