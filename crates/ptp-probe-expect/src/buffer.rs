//! Output accumulation and pattern search.

/// Accumulates received bytes for the life of one script run.
///
/// Nothing bounds growth beyond the run itself; scripts are short-lived
/// diagnostic sessions, not long-running log tails. Patterns are literal
/// byte sequences, no pattern language is involved.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Byte offset one past the end of the first occurrence of `pattern`.
    ///
    /// Matches may span chunk boundaries since the search runs over the
    /// whole accumulated buffer. An empty pattern matches at offset zero.
    pub fn find(&self, pattern: &str) -> Option<usize> {
        let pat = pattern.as_bytes();
        if pat.is_empty() {
            return Some(0);
        }
        if self.data.len() < pat.len() {
            return None;
        }
        self.data
            .windows(pat.len())
            .position(|window| window == pat)
            .map(|start| start + pat.len())
    }

    /// Remove and return everything up to `end`, lossily decoded.
    ///
    /// # Panics
    ///
    /// Panics if `end` exceeds the buffer length; callers pass offsets
    /// returned by [`find`](OutputBuffer::find).
    pub fn take_through(&mut self, end: usize) -> String {
        let consumed: Vec<u8> = self.data.drain(..end).collect();
        String::from_utf8_lossy(&consumed).into_owned()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_returns_offset_past_match() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"welcome\nsh-4.4# ");

        let end = buffer.find("sh-4.4#").unwrap();
        assert_eq!(&buffer.take_through(end), "welcome\nsh-4.4#");
    }

    #[test]
    fn test_find_missing_pattern() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"some output");
        assert_eq!(buffer.find("sh-4.4#"), None);
    }

    #[test]
    fn test_find_spans_chunk_boundary() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"sh-4");
        assert_eq!(buffer.find("sh-4.4#"), None);

        buffer.append(b".4# ");
        assert!(buffer.find("sh-4.4#").is_some());
    }

    #[test]
    fn test_take_through_leaves_remainder() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"sh-4.4# ls -ltr\ntotal 0\nsh-4.4# ");

        let end = buffer.find("sh-4.4#").unwrap();
        let consumed = buffer.take_through(end);
        assert_eq!(consumed, "sh-4.4#");

        // The second prompt is still findable in the remainder
        assert!(buffer.find("sh-4.4#").is_some());
        assert_eq!(buffer.len(), b" ls -ltr\ntotal 0\nsh-4.4# ".len());
    }

    #[test]
    fn test_empty_pattern_matches_immediately() {
        let buffer = OutputBuffer::new();
        assert_eq!(buffer.find(""), Some(0));
    }

    #[test]
    fn test_lossy_decode_of_non_utf8() {
        let mut buffer = OutputBuffer::new();
        buffer.append(&[0xFF, b'o', b'k']);

        let end = buffer.find("ok").unwrap();
        let consumed = buffer.take_through(end);
        assert!(consumed.ends_with("ok"));
        assert!(buffer.is_empty());
    }
}
