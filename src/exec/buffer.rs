// src/exec/buffer.rs

//! Per-channel output accumulator.

/// Ordered raw chunks of one output channel plus their total length.
///
/// Chunks are stored as received and only decoded in [`materialize`], so a
/// multi-byte UTF-8 sequence split across two reads decodes correctly.
///
/// [`materialize`]: ChannelBuffer::materialize
#[derive(Debug, Default)]
pub struct ChannelBuffer {
    chunks: Vec<Vec<u8>>,
    len: usize,
}

impl ChannelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: Vec<u8>) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Total bytes appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decode the concatenation of all chunks. Invalid sequences are replaced
    /// with U+FFFD.
    pub fn materialize(&self) -> String {
        let mut bytes = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            bytes.extend_from_slice(chunk);
        }
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_arrival_order() {
        let mut buf = ChannelBuffer::new();
        buf.append(b"hel".to_vec());
        buf.append(b"lo ".to_vec());
        buf.append(b"world".to_vec());

        assert_eq!(buf.len(), 11);
        assert_eq!(buf.materialize(), "hello world");
    }

    #[test]
    fn split_multibyte_sequence_is_decoded_whole() {
        let snowman = "☃".as_bytes();
        let mut buf = ChannelBuffer::new();
        buf.append(snowman[..1].to_vec());
        buf.append(snowman[1..].to_vec());

        assert_eq!(buf.materialize(), "☃");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut buf = ChannelBuffer::new();
        buf.append(vec![b'a', 0xff, b'b']);
        assert_eq!(buf.materialize(), "a\u{fffd}b");
    }

    #[test]
    fn empty_buffer_materializes_to_empty_string() {
        let buf = ChannelBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.materialize(), "");
    }
}
