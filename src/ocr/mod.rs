//! OCR domain — cloud text recognition and transcript reconstruction.
//!
//! The heavy lifting happens at the provider: we upload the screenshot and
//! get back positioned text fragments. Everything downstream of the wire
//! format (`OcrResponse`) is ours.

pub mod client;
pub mod image_prep;
pub mod transcript;

use serde::{Deserialize, Serialize};

/// Pixel rectangle locating a fragment in the source image.
///
/// Coordinates are in the original, untransformed image space the provider
/// saw. Reconstruction only ever compares relative magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrLocation {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One recognized text region.
///
/// `words` and `location` can be absent in degenerate provider output; such
/// fragments are filtered during reconstruction instead of failing the batch.
/// `probability` is carried for debuggability but consulted nowhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrWord {
    #[serde(default)]
    pub words: String,
    #[serde(default)]
    pub location: Option<OcrLocation>,
    #[serde(default)]
    pub probability: Option<f64>,
}

/// The provider's recognition result for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub words_result: Vec<OcrWord>,
    #[serde(default)]
    pub words_result_num: u64,
    #[serde(default)]
    pub log_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_deserializes_provider_shape() {
        let raw = serde_json::json!({
            "words_result": [
                {
                    "words": "你好",
                    "location": {"left": 100, "top": 20, "width": 80, "height": 24},
                    "probability": 0.97
                }
            ],
            "words_result_num": 1,
            "log_id": 173942
        });
        let resp: OcrResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.words_result.len(), 1);
        assert_eq!(resp.words_result[0].words, "你好");
        assert_eq!(resp.words_result[0].location.as_ref().unwrap().left, 100);
    }

    #[test]
    fn fragment_tolerates_missing_fields() {
        let raw = serde_json::json!({
            "words_result": [{"words": "orphan"}, {}],
            "words_result_num": 2
        });
        let resp: OcrResponse = serde_json::from_value(raw).unwrap();
        assert!(resp.words_result[0].location.is_none());
        assert!(resp.words_result[1].words.is_empty());
    }

    #[test]
    fn empty_body_is_not_an_error() {
        let resp: OcrResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(resp.words_result.is_empty());
    }
}
