//! SSE (Server-Sent Events) stream decoding
//!
//! Decodes the Goose `/reply` stream. The backend frames every event as a
//! single `data: <json>` line; everything else on the wire (blank separators,
//! `:` keep-alive comments, other fields) carries no payload and is skipped.
//!
//! # Module structure
//! - `events` - Event type definitions (SseEvent, SseLine, SseParseError)
//! - `decoder` - Incremental line framing (FrameDecoder, DecodedFrames)
//! - `utf8` - Chunk-to-text conversion across split code points

mod decoder;
mod events;
mod utf8;

pub use decoder::{parse_data_line, parse_sse_line, DecodedFrames, FrameDecoder, DATA_PREFIX};
pub use events::{SseEvent, SseLine, SseParseError};
pub use utf8::Utf8Carry;
