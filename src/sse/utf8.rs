//! Byte-to-text conversion for streamed chunks.

use crate::sse::events::SseParseError;

/// Converts body chunks to text, carrying an incomplete trailing code point
/// over to the next chunk.
///
/// Invalid sequences are an error; the offending chunk is dropped along with
/// anything carried.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, prefixed by any bytes carried from the previous call.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, SseParseError> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let err = match String::from_utf8(bytes) {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        let utf8_error = err.utf8_error();
        if utf8_error.error_len().is_some() {
            return Err(SseParseError::InvalidUtf8 {
                valid_up_to: utf8_error.valid_up_to(),
            });
        }

        // Truncated sequence at the end of the chunk
        let valid_up_to = utf8_error.valid_up_to();
        let mut bytes = err.into_bytes();
        self.pending = bytes.split_off(valid_up_to);
        String::from_utf8(bytes).map_err(|e| SseParseError::InvalidUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }

    /// Whether a partial code point is waiting for its remaining bytes
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(b"data: x\n").unwrap(), "data: x\n");
        assert!(!carry.has_pending());
    }

    #[test]
    fn test_code_point_split_across_chunks() {
        let bytes = "é✓".as_bytes();
        let mut carry = Utf8Carry::new();

        assert_eq!(carry.decode(&bytes[..1]).unwrap(), "");
        assert!(carry.has_pending());
        assert_eq!(carry.decode(&bytes[1..3]).unwrap(), "é");
        assert_eq!(carry.decode(&bytes[3..]).unwrap(), "✓");
        assert!(!carry.has_pending());
    }

    #[test]
    fn test_invalid_sequence_is_rejected() {
        let mut carry = Utf8Carry::new();
        let result = carry.decode(&[b'o', b'k', 0xFF, b'x']);
        assert_eq!(result, Err(SseParseError::InvalidUtf8 { valid_up_to: 2 }));
        assert!(!carry.has_pending());
    }
}
