//! Incremental SSE frame decoding.
//!
//! The transport hands us text at arbitrary boundaries. [`FrameDecoder`] keeps
//! the unterminated tail of the stream between calls and only ever decodes
//! lines that have seen their terminator.

use crate::sse::events::{SseEvent, SseLine, SseParseError};

/// Prefix of a payload-carrying line. Exactly one space after the colon.
pub const DATA_PREFIX: &str = "data: ";

/// Classify a single SSE line (terminator already removed)
pub fn parse_sse_line(line: &str) -> SseLine<'_> {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        return SseLine::Data(payload);
    }

    if let Some(comment) = line.strip_prefix(':') {
        return SseLine::Comment(comment.trim());
    }

    SseLine::Other(line)
}

/// Decode one complete line.
///
/// Returns `None` for lines that carry no event: non-data lines and `data:`
/// lines with an empty payload (heartbeats).
pub fn parse_data_line(line: &str) -> Option<Result<SseEvent, SseParseError>> {
    let SseLine::Data(payload) = parse_sse_line(line) else {
        return None;
    };

    if payload.trim().is_empty() {
        return None;
    }

    Some(
        serde_json::from_str(payload).map_err(|e| SseParseError::InvalidJson {
            payload: payload.to_string(),
            reason: e.to_string(),
        }),
    )
}

/// Stateful decoder for one stream.
///
/// Its only state is the pending partial line. Create one per request.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: String,
}

impl FrameDecoder {
    /// Create a decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the frames completed by it.
    ///
    /// Everything up to the last `\n` is handed to the returned iterator;
    /// whatever follows stays buffered for the next call. Frames are decoded
    /// lazily, in stream order, as the iterator advances.
    pub fn feed(&mut self, chunk: &str) -> DecodedFrames {
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return DecodedFrames::default();
        };

        let remainder = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, remainder);
        DecodedFrames::new(complete)
    }

    /// Text received since the last line terminator
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop any buffered partial line
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Lazy iterator over the frames completed by one [`FrameDecoder::feed`] call.
///
/// Yields one item per non-empty `data: ` line. A malformed frame yields an
/// `Err` and iteration continues with the next line.
#[derive(Debug, Default)]
pub struct DecodedFrames {
    lines: String,
    cursor: usize,
}

impl DecodedFrames {
    fn new(lines: String) -> Self {
        Self { lines, cursor: 0 }
    }
}

impl Iterator for DecodedFrames {
    type Item = Result<SseEvent, SseParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.lines.len() {
            let rest = &self.lines[self.cursor..];
            let end = rest.find('\n').unwrap_or(rest.len());
            let raw = &rest[..end];
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            self.cursor += end + 1;

            if let Some(frame) = parse_data_line(line) {
                return Some(frame);
            }
        }
        None
    }
}
