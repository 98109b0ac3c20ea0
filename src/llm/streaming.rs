//! SSE parsing shared by the streaming reply providers.
//!
//! Anthropic frames events as `event: <type>` + `data: <json>` pairs;
//! DeepSeek (OpenAI-compatible) and Dify send data-only frames. Both
//! separate frames with a blank line. The parsers consume complete frames
//! from a growing buffer and leave any trailing partial frame in place.

/// Consume complete `event:`/`data:` frames from the buffer.
///
/// Returns `(event_type, data)` pairs. The unterminated tail stays in the
/// buffer for the next network chunk.
pub fn parse_sse_events(buffer: &mut String) -> Vec<(String, String)> {
    let mut events = Vec::new();
    while let Some(split) = buffer.find("\n\n") {
        let frame: String = buffer.drain(..split + 2).collect();
        let mut event_type = String::new();
        let mut data = String::new();
        for line in frame.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event_type = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(rest.trim_start());
            }
        }
        if !event_type.is_empty() || !data.is_empty() {
            events.push((event_type, data));
        }
    }
    events
}

/// Consume complete data-only frames (`data: {...}`) from the buffer.
///
/// The `[DONE]` terminator frame is dropped here so callers only ever see
/// JSON payloads.
pub fn parse_data_only_sse_events(buffer: &mut String) -> Vec<String> {
    parse_sse_events(buffer)
        .into_iter()
        .filter_map(|(_, data)| {
            if data.is_empty() || data == "[DONE]" {
                None
            } else {
                Some(data)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_frames_and_keeps_tail() {
        let mut buf = String::from(
            "event: content_block_delta\ndata: {\"a\":1}\n\nevent: message_stop\nda",
        );
        let events = parse_sse_events(&mut buf);
        assert_eq!(events, vec![(
            "content_block_delta".to_string(),
            "{\"a\":1}".to_string()
        )]);
        assert_eq!(buf, "event: message_stop\nda");
    }

    #[test]
    fn parses_data_only_frames() {
        let mut buf = String::from("data: {\"x\":1}\n\ndata: {\"x\":2}\n\ndata: [DONE]\n\n");
        let events = parse_data_only_sse_events(&mut buf);
        assert_eq!(events, vec!["{\"x\":1}".to_string(), "{\"x\":2}".to_string()]);
        assert!(buf.is_empty());
    }

    #[test]
    fn multiline_data_joined_with_newline() {
        let mut buf = String::from("data: line one\ndata: line two\n\n");
        let events = parse_sse_events(&mut buf);
        assert_eq!(events[0].1, "line one\nline two");
    }

    #[test]
    fn incomplete_frame_yields_nothing() {
        let mut buf = String::from("data: {\"partial\":");
        assert!(parse_data_only_sse_events(&mut buf).is_empty());
        assert_eq!(buf, "data: {\"partial\":");
    }
}
