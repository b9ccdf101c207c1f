// Line framer - reassembles fragmented transport chunks into whole lines
/// Cap on an unterminated partial line, in case a sensor wedges mid-line.
const MAX_PENDING_LINE: usize = 64 * 1024;

/// Accumulates raw fragments and splits out complete `\n`-terminated lines,
/// keeping the trailing partial line for the next fragment. Never fails;
/// splitting is independent of where the fragment boundaries fall.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one fragment and return every line completed by it, in
    /// arrival order, with the terminator (and a preceding `\r`) stripped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let mut line = &self.pending[consumed..end];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }
            // The protocol is ASCII apart from unit suffixes; a mangled
            // multi-byte char only ever lands in a tolerated suffix.
            lines.push(String::from_utf8_lossy(line).into_owned());
            consumed = end + 1;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > MAX_PENDING_LINE {
            tracing::warn!(
                dropped_bytes = self.pending.len(),
                "no line terminator seen, discarding runaway partial line"
            );
            self.pending.clear();
        }

        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partial line so stale bytes never leak into a new session.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_fragment_boundary_independent() {
        // The same bytes split across fragments must frame identically.
        let mut split = LineFramer::new();
        let mut collected = split.feed(b"Lat: 1");
        collected.extend(split.feed(b"2.5\nLon: 99.0\n"));

        let mut whole = LineFramer::new();
        let expected = whole.feed(b"Lat: 12.5\nLon: 99.0\n");

        assert_eq!(collected, expected);
        assert_eq!(collected, vec!["Lat: 12.5", "Lon: 99.0"]);
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"pH: 6.").is_empty());
        assert_eq!(framer.pending_len(), 6);
        assert_eq!(framer.feed(b"5\n"), vec!["pH: 6.5"]);
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_multiple_lines_in_one_fragment() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"a\nb\nc");
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(framer.feed(b"\n"), vec!["c"]);
    }

    #[test]
    fn test_empty_fragment_and_empty_lines() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"").is_empty());
        assert_eq!(framer.feed(b"\n\n"), vec!["", ""]);
    }

    #[test]
    fn test_crlf_terminator_is_stripped() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"Temp: 25.4 \xc2\xb0C\r\n"), vec!["Temp: 25.4 °C"]);
    }

    #[test]
    fn test_reset_discards_partial() {
        let mut framer = LineFramer::new();
        framer.feed(b"Lat: 12");
        framer.reset();
        assert_eq!(framer.feed(b".5\n"), vec![".5"]);
    }

    #[test]
    fn test_runaway_partial_is_discarded() {
        let mut framer = LineFramer::new();
        let noise = vec![b'x'; MAX_PENDING_LINE + 1];
        assert!(framer.feed(&noise).is_empty());
        assert_eq!(framer.pending_len(), 0);
        // Framing recovers as soon as terminated lines reappear.
        assert_eq!(framer.feed(b"pH: 7.0\n"), vec!["pH: 7.0"]);
    }
}
