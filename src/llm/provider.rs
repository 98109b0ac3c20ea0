//! Reply provider metadata — common info for all reply-generation backends.
//!
//! The pipeline dispatches to the active provider based on user
//! configuration; the settings panel renders this metadata.

use serde::{Deserialize, Serialize};

/// Provider metadata exposed to the settings panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub env_key: String,
    pub cost_per_reply: String,
    pub speed_stars: u8,
    pub quality_stars: u8,
}

/// All known providers and their display info.
pub fn all_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: "claude".to_string(),
            name: "Claude Sonnet — 自然流畅，~$0.01/条".to_string(),
            env_key: "ANTHROPIC_API_KEY".to_string(),
            cost_per_reply: "~$0.01".to_string(),
            speed_stars: 4,
            quality_stars: 5,
        },
        ProviderInfo {
            id: "deepseek".to_string(),
            name: "DeepSeek Reasoner — 带思考过程，~$0.002/条".to_string(),
            env_key: "DEEPSEEK_API_KEY".to_string(),
            cost_per_reply: "~$0.002".to_string(),
            speed_stars: 3,
            quality_stars: 4,
        },
        ProviderInfo {
            id: "dify".to_string(),
            name: "Dify 工作流 — 自定义流程，按工作流计费".to_string(),
            env_key: "DIFY_API_KEY".to_string(),
            cost_per_reply: "按工作流".to_string(),
            speed_stars: 3,
            quality_stars: 4,
        },
    ]
}

/// Check if a provider has an API key configured.
pub fn is_provider_configured(provider_id: &str) -> bool {
    let env_key = match provider_id {
        "claude" => "ANTHROPIC_API_KEY",
        "deepseek" => "DEEPSEEK_API_KEY",
        "dify" => "DIFY_API_KEY",
        _ => return false,
    };
    std::env::var(env_key)
        .map(|k| !k.is_empty())
        .unwrap_or(false)
}
