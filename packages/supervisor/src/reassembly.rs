//! Line reassembly. Stdout arrives in arbitrarily sized chunks that have no
//! relation to line boundaries; this buffer glues them back into whole
//! `\n`-terminated lines regardless of how the underlying reads happened to
//! split the byte stream, so the reassembled sequence of messages is
//! identical no matter where a read boundary falls mid-line.

/// Accumulates raw bytes and yields complete lines as they become
/// available. Empty lines (after trimming whitespace) are dropped here.
#[derive(Debug, Default)]
pub struct LineReassembler {
    buffer: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        LineReassembler::default()
    }

    /// Feeds a chunk of bytes, returning every complete line it produced
    /// (in order). Any trailing partial fragment is retained for the next
    /// call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();

        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n');
            let Some(pos) = newline_pos else { break };
            let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]).to_string();
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        lines
    }

    /// Flushes whatever partial content remains once the underlying stream
    /// has closed, so a final unterminated line is not silently dropped.
    pub fn finish(mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let remaining = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        if remaining.is_empty() {
            None
        } else {
            Some(remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble_in_chunks(text: &[u8], chunk_size: usize) -> Vec<String> {
        let mut reassembler = LineReassembler::new();
        let mut out = Vec::new();
        for chunk in text.chunks(chunk_size.max(1)) {
            out.extend(reassembler.push(chunk));
        }
        if let Some(tail) = reassembler.finish() {
            out.push(tail);
        }
        out
    }

    #[test]
    fn reassembly_is_independent_of_chunk_boundaries() {
        let text = b"{\"type\":\"step:start\",\"stepIndex\":0,\"stepTotal\":2}\n{\"type\":\"step:complete\",\"stepIndex\":0,\"stepTotal\":2,\"status\":\"passed\",\"duration\":123}\n";

        let baseline = reassemble_in_chunks(text, text.len());
        for chunk_size in 1..=text.len() {
            let actual = reassemble_in_chunks(text, chunk_size);
            assert_eq!(actual, baseline, "chunk_size={}", chunk_size);
        }
    }

    #[test]
    fn split_mid_line_reassembles_correctly() {
        let mut reassembler = LineReassembler::new();
        let mut lines = reassembler.push(b"{\"type\":\"step:start\",\"stepIndex\":0,\"stepTotal\":2}\n{\"type\":\"step:co");
        assert_eq!(lines, vec!["{\"type\":\"step:start\",\"stepIndex\":0,\"stepTotal\":2}"]);
        lines = reassembler.push(b"mplete\",\"stepIndex\":0,\"stepTotal\":2,\"status\":\"passed\",\"duration\":123}\n");
        assert_eq!(
            lines,
            vec!["{\"type\":\"step:complete\",\"stepIndex\":0,\"stepTotal\":2,\"status\":\"passed\",\"duration\":123}"]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut reassembler = LineReassembler::new();
        let lines = reassembler.push(b"\n   \nhello\n\n");
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn unterminated_tail_is_only_returned_by_finish() {
        let mut reassembler = LineReassembler::new();
        assert!(reassembler.push(b"no newline yet").is_empty());
        assert_eq!(reassembler.finish(), Some("no newline yet".to_string()));
    }

    #[test]
    fn finish_with_empty_buffer_yields_nothing() {
        let reassembler = LineReassembler::new();
        assert_eq!(reassembler.finish(), None);
    }
}
