// Server-sent events line buffer
//
// Network chunks split SSE lines at arbitrary byte offsets; this buffers bytes
// and hands back complete `data:` payloads.

use crate::constitution::ModelInvocationError;

#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete `data:` payload, trimmed. Other SSE fields (`event:`,
    /// `id:`, comments) are skipped.
    pub(crate) fn next_data(&mut self) -> Option<String> {
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    return Some(data.to_string());
                }
            }
        }
        None
    }

    /// Bytes after the last newline. Non-blank leftovers at end of stream
    /// mean the final line was cut off.
    pub(crate) fn has_partial_line(&self) -> bool {
        self.buffer.iter().any(|b| !b.is_ascii_whitespace())
    }
}

/// Error for a byte stream that closed before its terminal event.
pub(crate) fn truncated_stream_error(sse: &SseBuffer, terminal: &str) -> ModelInvocationError {
    let detail = if sse.has_partial_line() {
        "stream ended mid-event"
    } else {
        "stream ended"
    };
    ModelInvocationError::Malformed(format!("{} before {}", detail, terminal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembles_split_lines() {
        let mut sse = SseBuffer::new();
        sse.extend(b"event: content_block_delta\ndata: {\"a\":");
        assert_eq!(sse.next_data(), None);

        sse.extend(b" 1}\n\n");
        assert_eq!(sse.next_data().as_deref(), Some("{\"a\": 1}"));
        assert_eq!(sse.next_data(), None);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut sse = SseBuffer::new();
        sse.extend(b"data: one\n\n: keep-alive\ndata:two\r\n");
        assert_eq!(sse.next_data().as_deref(), Some("one"));
        assert_eq!(sse.next_data().as_deref(), Some("two"));
    }

    #[test]
    fn test_partial_line_detected() {
        let mut sse = SseBuffer::new();
        sse.extend(b"data: complete\n\n");
        assert_eq!(sse.next_data().as_deref(), Some("complete"));
        assert!(!sse.has_partial_line());

        sse.extend(b"data: {\"type\":\"message_st");
        assert_eq!(sse.next_data(), None);
        assert!(sse.has_partial_line());
        assert_eq!(
            truncated_stream_error(&sse, "message_stop"),
            ModelInvocationError::Malformed(
                "stream ended mid-event before message_stop".to_string()
            )
        );
    }
}
