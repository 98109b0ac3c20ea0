//! Transcript reconstruction — positioned OCR fragments to a chat transcript.
//!
//! The OCR provider returns an unordered bag of text fragments with pixel
//! bounding boxes. This module rebuilds the conversation: sort by vertical
//! position, attribute each fragment to a speaker from its horizontal
//! position, and serialize into a newline-delimited, role-prefixed string
//! ready for the reply prompt.
//!
//! Everything here is pure and synchronous. Network, state, and retries live
//! in the pipeline; this module only compares numbers and matches patterns.

use std::sync::OnceLock;

use regex::Regex;

use super::{OcrResponse, OcrWord};

/// Speaker attribution for one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Right-aligned bubble — the user's own message.
    Me,
    /// Left-aligned bubble — the counterpart's message.
    Other,
    /// A timestamp or date line.
    Time,
    /// Unclassifiable — dropped from the transcript.
    Unknown,
}

/// Horizontal split between counterpart (left) and self (right) bubbles, in
/// source-image pixels. Calibrated for the screenshot resolution class the
/// chat client produces; callers needing resolution independence must
/// normalize coordinates before reconstruction.
pub const SPEAKER_SPLIT_X: u32 = 500;

/// Returned when the OCR response carries no usable fragments at all.
pub const NO_TEXT_DETECTED: &str = "未检测到有效文本";
/// Returned when fragments existed but every one was filtered to nothing.
pub const EMPTY_PARSE_RESULT: &str = "解析结果为空";
/// User-facing message for an unexpected internal failure. Deliberately
/// opaque — parsing internals never reach the end user.
pub const PARSE_FAILED_RETRY: &str = "解析失败，请重试";

const SELF_PREFIX: &str = "[我] ";
const OTHER_PREFIX: &str = "[对方] ";

/// System notice inserted by the chat client when a message is recalled.
/// Has no stable horizontal position, so it must be suppressed before the
/// positional rules run.
const RECALL_NOTICE: &str = "recalled a message";

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap())
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap())
}

fn loose_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+\s*\d+,?\s*\d{4}\s*\d{1,2}:\d{2}").unwrap())
}

fn mangled_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\s*(\d+),?\s*(\d{4})\s*(\d{1,2}):(\d{2})").unwrap())
}

/// Classify one fragment from its text and horizontal position.
///
/// Total over all inputs — no input produces an error. First match wins:
/// recall notices, then timestamp patterns, then the positional split.
pub fn classify(text: &str, left: u32) -> Role {
    if text.contains(RECALL_NOTICE) {
        log::debug!("[TRANSCRIPT] recall notice: {:?}", text);
        return Role::Unknown;
    }

    if clock_re().is_match(text)
        || iso_date_re().is_match(text)
        || loose_datetime_re().is_match(text)
    {
        return Role::Time;
    }

    if left > SPEAKER_SPLIT_X {
        Role::Me
    } else if left < SPEAKER_SPLIT_X {
        Role::Other
    } else {
        Role::Unknown
    }
}

/// Normalize an OCR-mangled date-time capture like "Oct23,202416:17" into
/// `"{year}-{month}-{day} {hour}:{minute}"`.
///
/// Captures are emitted verbatim — no calendar validation, no month-name
/// conversion. Text that doesn't match is returned unchanged.
pub fn format_time(text: &str) -> String {
    match mangled_datetime_re().captures(text) {
        Some(caps) => {
            let formatted = format!(
                "{}-{}-{} {}:{}",
                &caps[3], &caps[1], &caps[2], &caps[4], &caps[5]
            );
            log::debug!("[TRANSCRIPT] time {:?} -> {:?}", text, formatted);
            formatted
        }
        None => text.to_string(),
    }
}

/// Rebuild the chat transcript from a raw OCR response.
///
/// Fragments missing text or a bounding box are filtered, never batch-fatal.
/// The sort by `top` is stable: fragments of a multi-line bubble share nearly
/// identical vertical positions and must keep their original relative order.
///
/// Returns [`NO_TEXT_DETECTED`] when nothing usable survives filtering and
/// [`EMPTY_PARSE_RESULT`] when fragments existed but serialized to nothing
/// (e.g. all recall notices). Never fails.
pub fn reconstruct(response: &OcrResponse) -> String {
    let mut fragments: Vec<&OcrWord> = response
        .words_result
        .iter()
        .filter(|word| {
            if word.words.is_empty() || word.location.is_none() {
                log::debug!("[TRANSCRIPT] dropping malformed fragment: {:?}", word.words);
                return false;
            }
            true
        })
        .collect();

    fragments.sort_by_key(|word| word.location.as_ref().map(|loc| loc.top));

    let classified: Vec<(Role, &str)> = fragments
        .iter()
        .filter_map(|word| {
            let text = word.words.trim();
            if text.is_empty() {
                return None;
            }
            let left = word.location.as_ref().map(|loc| loc.left)?;
            let role = classify(text, left);
            log::debug!("[TRANSCRIPT] {:?} at left={} -> {:?}", text, left, role);
            Some((role, text))
        })
        .collect();

    if classified.is_empty() {
        log::debug!("[TRANSCRIPT] no valid fragments after filtering");
        return NO_TEXT_DETECTED.to_string();
    }

    let mut out = String::new();
    let mut current_role: Option<Role> = None;

    for (role, text) in classified {
        match role {
            Role::Time => {
                // A timestamp always breaks a run of same-speaker lines.
                out.push_str(&format_time(text));
                out.push('\n');
                current_role = None;
            }
            Role::Unknown => {}
            Role::Me | Role::Other => {
                if current_role != Some(role) {
                    out.push_str(if role == Role::Me { SELF_PREFIX } else { OTHER_PREFIX });
                    current_role = Some(role);
                }
                out.push_str(text);
                out.push('\n');
            }
        }
    }

    if out.is_empty() {
        EMPTY_PARSE_RESULT.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrLocation;

    fn word(text: &str, left: u32, top: u32) -> OcrWord {
        OcrWord {
            words: text.to_string(),
            location: Some(OcrLocation {
                left,
                top,
                width: 120,
                height: 24,
            }),
            probability: Some(0.98),
        }
    }

    fn response(words: Vec<OcrWord>) -> OcrResponse {
        OcrResponse {
            words_result_num: words.len() as u64,
            words_result: words,
            log_id: 1,
        }
    }

    #[test]
    fn classify_bare_clock_time_at_any_position() {
        assert_eq!(classify("14:32", 0), Role::Time);
        assert_eq!(classify("14:32", 501), Role::Time);
        assert_eq!(classify("9:05", 499), Role::Time);
    }

    #[test]
    fn classify_iso_date_prefix() {
        assert_eq!(classify("2024-10-23 晚上", 100), Role::Time);
    }

    #[test]
    fn classify_mangled_datetime() {
        assert_eq!(classify("Oct23,202416:17", 320), Role::Time);
    }

    #[test]
    fn classify_position_split() {
        assert_eq!(classify("some text", 501), Role::Me);
        assert_eq!(classify("some text", 499), Role::Other);
        assert_eq!(classify("some text", 500), Role::Unknown);
    }

    #[test]
    fn classify_recall_notice_beats_position() {
        assert_eq!(classify("他 recalled a message", 501), Role::Unknown);
        assert_eq!(classify("You recalled a message", 100), Role::Unknown);
    }

    #[test]
    fn format_time_spaced_capture() {
        assert_eq!(format_time("Oct 23, 2024 16:17"), "2024-Oct-23 16:17");
    }

    #[test]
    fn format_time_non_matching_passthrough() {
        assert_eq!(format_time("hello"), "hello");
        assert_eq!(format_time("14:32"), "14:32");
    }

    #[test]
    fn reconstruct_empty_response() {
        assert_eq!(reconstruct(&response(vec![])), NO_TEXT_DETECTED);
    }

    #[test]
    fn reconstruct_whitespace_only_fragments() {
        let resp = response(vec![word("   ", 100, 10)]);
        assert_eq!(reconstruct(&resp), NO_TEXT_DETECTED);
    }

    #[test]
    fn reconstruct_all_recalled_is_distinct_sentinel() {
        let resp = response(vec![
            word("他 recalled a message", 100, 10),
            word("你 recalled a message", 600, 20),
        ]);
        assert_eq!(reconstruct(&resp), EMPTY_PARSE_RESULT);
    }

    #[test]
    fn reconstruct_merges_consecutive_same_role() {
        let resp = response(vec![
            word("第一句", 600, 10),
            word("第二句", 610, 20),
            word("第三句", 620, 30),
        ]);
        assert_eq!(reconstruct(&resp), "[我] 第一句\n第二句\n第三句\n");
    }

    #[test]
    fn reconstruct_timestamp_breaks_role_run() {
        let resp = response(vec![
            word("早上好", 600, 10),
            word("14:32", 300, 20),
            word("下午好", 600, 30),
        ]);
        assert_eq!(reconstruct(&resp), "[我] 早上好\n14:32\n[我] 下午好\n");
    }

    #[test]
    fn reconstruct_unknown_does_not_break_role_run() {
        let resp = response(vec![
            word("在吗", 600, 10),
            word("他 recalled a message", 100, 20),
            word("看到回我", 600, 30),
        ]);
        assert_eq!(reconstruct(&resp), "[我] 在吗\n看到回我\n");
    }

    #[test]
    fn reconstruct_sorts_by_top() {
        let resp = response(vec![
            word("后说的", 100, 300),
            word("先说的", 100, 10),
        ]);
        assert_eq!(reconstruct(&resp), "[对方] 先说的\n后说的\n");
    }

    #[test]
    fn reconstruct_stable_on_equal_top() {
        // A two-fragment bubble at the same vertical position keeps its
        // original relative order.
        let resp = response(vec![
            word("上半句", 100, 50),
            word("下半句", 110, 50),
        ]);
        assert_eq!(reconstruct(&resp), "[对方] 上半句\n下半句\n");
    }

    #[test]
    fn reconstruct_filters_missing_location() {
        let mut broken = word("orphan", 0, 0);
        broken.location = None;
        let resp = response(vec![broken, word("你好", 100, 10)]);
        assert_eq!(reconstruct(&resp), "[对方] 你好\n");
    }

    #[test]
    fn reconstruct_end_to_end_example() {
        let resp = response(vec![
            word("14:32", 300, 10),
            word("你好", 100, 20),
            word("你好呀", 600, 30),
        ]);
        assert_eq!(reconstruct(&resp), "14:32\n[对方] 你好\n[我] 你好呀\n");
    }

    #[test]
    fn reconstruct_trims_fragment_text() {
        let resp = response(vec![word("  你好  ", 100, 10)]);
        assert_eq!(reconstruct(&resp), "[对方] 你好\n");
    }
}
