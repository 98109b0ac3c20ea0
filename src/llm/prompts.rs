//! Reply-generation prompt templates and rendering.
//!
//! The template is the contract between the app and the LLM. The settings
//! panel lets the user edit it; `{text}` and `{background}` are the two
//! substitution points the renderer fills in.

pub const CLAUDE_MODEL: &str = "claude-3-5-sonnet-latest";
pub const DEEPSEEK_MODEL: &str = "deepseek-reasoner";
pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

/// Default reply-generation template.
pub const REPLY_GENERATION_PROMPT: &str = r#"在回复基于结构化聊天记录时，请遵循以下规则：
1. 分析对话场景：
   - 识别对话主题和背景（如：工作交流、节日问候等）
   - 识别对话参与者的角色关系（如：同事、上下级等）
   - 关注重要的时间节点或系统消息
2. 确定回复身份：
   - 如果需要延续对话，应该基于"自己"的角色继续对话
   - 注意保持与前文一致的对话语气和正式程度
3. 回复原则：
   - 保持对话的连贯性，承接最后一条消息的内容
   - 维持合适的社交礼仪和专业度
   - 使用与场景相符的表达方式和表情符号
   - 如果是正式场合，保持恰当的敬语和礼貌用语
   - 针对节日/特殊场合的消息，使用相应的祝福语
4. 格式规范：
   - 回复应简洁明确
   - 适当使用表情符号，但不过度
   - 如需分段，使用自然的语言过渡
   - 保持与原对话风格的一致性

以下是背景信息：
{background}

以下是聊天记录：
{text}

请基于以上规则，生成一个得体、自然的回复。"#;

/// System prompt for the DeepSeek provider.
pub const DEEPSEEK_SYSTEM_PROMPT: &str =
    "你是一个专业的微信回复助手，擅长生成自然、有温度的回复。";

/// Render a reply prompt from a template.
///
/// Unknown placeholders are left in place; a template without placeholders
/// is passed through as-is (the user may have replaced it wholesale).
pub fn build_reply_prompt(template: &str, transcript: &str, background: &str) -> String {
    template
        .replace("{text}", transcript)
        .replace("{background}", background)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_both_placeholders() {
        let rendered = build_reply_prompt("A {background} B {text} C", "聊天", "背景");
        assert_eq!(rendered, "A 背景 B 聊天 C");
    }

    #[test]
    fn template_without_placeholders_unchanged() {
        assert_eq!(build_reply_prompt("固定内容", "x", "y"), "固定内容");
    }

    #[test]
    fn default_template_carries_placeholders() {
        assert!(REPLY_GENERATION_PROMPT.contains("{text}"));
        assert!(REPLY_GENERATION_PROMPT.contains("{background}"));
    }
}
