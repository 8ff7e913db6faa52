// Line classification for the filtered stream.
//
// Every line is one of: a keep-alive (blank), a post payload, or something
// else (operational messages, error frames, garbage). Only payloads go on
// to formatting; nothing here ever fails.

use crate::x::types::StreamFrame;

/// What a single stream line turned out to be.
#[derive(Debug)]
pub enum Frame {
    /// Blank or whitespace-only line.
    KeepAlive,
    /// A JSON record with a top-level `data` post.
    Payload(Box<StreamFrame>),
    /// Not JSON, or JSON without a post (e.g. an `errors` frame).
    Unrecognized,
}

/// Classify one line from the stream.
pub fn classify(line: &str) -> Frame {
    if line.trim().is_empty() {
        return Frame::KeepAlive;
    }

    match serde_json::from_str::<StreamFrame>(line) {
        Ok(frame) if frame.data.is_some() => Frame::Payload(Box::new(frame)),
        _ => Frame::Unrecognized,
    }
}
