//! Integration tests for transcript reconstruction.
//!
//! Feeds provider-shaped JSON through deserialization and the reconstructor,
//! the same path the pipeline takes after the OCR response arrives. Pure —
//! no network, no API keys.

use reply_glass_lib::ocr::transcript::{
    reconstruct, EMPTY_PARSE_RESULT, NO_TEXT_DETECTED,
};
use reply_glass_lib::ocr::OcrResponse;

fn response(raw: serde_json::Value) -> OcrResponse {
    serde_json::from_value(raw).expect("provider-shaped JSON should deserialize")
}

#[test]
fn wechat_style_screenshot_reconstructs() {
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "14:32", "location": {"left": 300, "top": 10, "width": 60, "height": 20}, "probability": 0.99},
            {"words": "你好", "location": {"left": 100, "top": 20, "width": 80, "height": 24}, "probability": 0.98},
            {"words": "你好呀", "location": {"left": 600, "top": 30, "width": 90, "height": 24}, "probability": 0.97}
        ],
        "words_result_num": 3,
        "log_id": 173942
    }));
    assert_eq!(reconstruct(&resp), "14:32\n[对方] 你好\n[我] 你好呀\n");
}

#[test]
fn fragments_arrive_unordered() {
    // The provider gives no ordering guarantee; reconstruction sorts by top.
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "第二条", "location": {"left": 100, "top": 200, "width": 80, "height": 24}},
            {"words": "14:32", "location": {"left": 300, "top": 10, "width": 60, "height": 20}},
            {"words": "第一条", "location": {"left": 100, "top": 100, "width": 80, "height": 24}}
        ],
        "words_result_num": 3
    }));
    assert_eq!(reconstruct(&resp), "14:32\n[对方] 第一条\n第二条\n");
}

#[test]
fn conversation_with_date_header_and_both_speakers() {
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "2024-10-23 19:02", "location": {"left": 280, "top": 5, "width": 140, "height": 20}},
            {"words": "周五一起吃饭吗", "location": {"left": 90, "top": 40, "width": 200, "height": 26}},
            {"words": "好啊", "location": {"left": 620, "top": 80, "width": 60, "height": 26}},
            {"words": "几点？", "location": {"left": 615, "top": 112, "width": 80, "height": 26}},
            {"words": "Oct23,202419:30", "location": {"left": 290, "top": 150, "width": 150, "height": 20}},
            {"words": "六点半，老地方", "location": {"left": 95, "top": 185, "width": 190, "height": 26}}
        ],
        "words_result_num": 6
    }));
    assert_eq!(
        reconstruct(&resp),
        "2024-10-23 19:02\n\
         [对方] 周五一起吃饭吗\n\
         [我] 好啊\n几点？\n\
         2024-Oct2-3 19:30\n\
         [对方] 六点半，老地方\n"
    );
}

#[test]
fn malformed_fragments_never_fail_the_batch() {
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "有效消息", "location": {"left": 100, "top": 50, "width": 120, "height": 24}},
            {"words": "没有位置"},
            {"location": {"left": 600, "top": 90, "width": 100, "height": 24}},
            {}
        ],
        "words_result_num": 4
    }));
    assert_eq!(reconstruct(&resp), "[对方] 有效消息\n");
}

#[test]
fn missing_words_result_is_the_no_text_sentinel() {
    let resp = response(serde_json::json!({"log_id": 7}));
    assert_eq!(reconstruct(&resp), NO_TEXT_DETECTED);
}

#[test]
fn recall_notices_anywhere_give_the_empty_parse_sentinel() {
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "张三 recalled a message", "location": {"left": 100, "top": 10, "width": 200, "height": 20}},
            {"words": "You recalled a message", "location": {"left": 620, "top": 40, "width": 200, "height": 20}}
        ],
        "words_result_num": 2
    }));
    assert_eq!(reconstruct(&resp), EMPTY_PARSE_RESULT);
}

#[test]
fn exact_threshold_fragment_is_dropped_silently() {
    let resp = response(serde_json::json!({
        "words_result": [
            {"words": "在吗", "location": {"left": 100, "top": 10, "width": 80, "height": 24}},
            {"words": "骑墙的", "location": {"left": 500, "top": 40, "width": 80, "height": 24}},
            {"words": "在的", "location": {"left": 100, "top": 70, "width": 80, "height": 24}}
        ],
        "words_result_num": 3
    }));
    // The left==500 fragment vanishes without breaking the speaker run.
    assert_eq!(reconstruct(&resp), "[对方] 在吗\n在的\n");
}
