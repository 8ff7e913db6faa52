// Newline framing for the filtered stream body.
//
// The stream sends one JSON record per line and a bare newline as a
// keep-alive. Chunks arrive at arbitrary boundaries, so a line (or a
// multi-byte character) may be split across reads.

/// Incremental splitter from byte chunks to complete lines.
///
/// Bytes are buffered until a `\n` arrives; only complete lines are
/// decoded, so UTF-8 sequences split across chunks come out intact.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, in order.
    ///
    /// The newline itself is not part of the returned line. Whatever follows
    /// the last newline stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Number of bytes waiting for a terminating newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End of stream: drop any unterminated remainder.
    ///
    /// The stream always newline-terminates its records, so a trailing
    /// fragment is a cut-off record and is never emitted. Returns how many
    /// bytes were dropped.
    pub fn finish(self) -> usize {
        self.pending.len()
    }
}
