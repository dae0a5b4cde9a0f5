//! Byte sinks the dumper writes into

use std::io::{self, BufWriter, Write};

use vpack_codec::{Result, VPackError};

/// Destination for dumped output
pub trait Sink {
    /// Append one byte
    fn push_byte(&mut self, byte: u8);
    /// Append a run of bytes
    fn append(&mut self, bytes: &[u8]);
    /// Hint that `additional` more bytes are coming
    fn reserve(&mut self, additional: usize);
}

impl Sink for Vec<u8> {
    fn push_byte(&mut self, byte: u8) {
        self.push(byte);
    }

    fn append(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }
}

/// Collects output into a `String`
#[derive(Debug, Default, Clone)]
pub struct StringSink {
    buffer: Vec<u8>,
}

impl StringSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The collected text
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.buffer).map_err(|_| VPackError::InvalidUtf8Sequence)
    }
}

impl Sink for StringSink {
    fn push_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }
}

/// Writes through a buffered `io::Write`
///
/// Write errors cannot surface through [`Sink`]; the first one is kept and
/// returned by [`StreamSink::finish`], and later writes are dropped.
pub struct StreamSink<W: Write> {
    writer: BufWriter<W>,
    error: Option<io::Error>,
}

impl<W: Write> StreamSink<W> {
    /// Sink over `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            error: None,
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.error.is_none() {
            if let Err(e) = self.writer.write_all(bytes) {
                self.error = Some(e);
            }
        }
    }

    /// Flush and return the writer, or the first write error
    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.writer
            .into_inner()
            .map_err(|e| VPackError::Io(e.into_error()))
    }
}

impl<W: Write> Sink for StreamSink<W> {
    fn push_byte(&mut self, byte: u8) {
        self.write(&[byte]);
    }

    fn append(&mut self, bytes: &[u8]) {
        self.write(bytes);
    }

    fn reserve(&mut self, _additional: usize) {}
}

/// Keeps at most `max_len` bytes and remembers whether more were offered
#[derive(Debug, Clone)]
pub struct SizeConstrainedSink {
    buffer: Vec<u8>,
    max_len: usize,
    overflowed: bool,
}

impl SizeConstrainedSink {
    /// Sink that truncates after `max_len` bytes
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_len,
            overflowed: false,
        }
    }

    /// Whether output was cut off
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Bytes kept so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The kept bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Sink for SizeConstrainedSink {
    fn push_byte(&mut self, byte: u8) {
        if self.buffer.len() < self.max_len {
            self.buffer.push(byte);
        } else {
            self.overflowed = true;
        }
    }

    fn append(&mut self, bytes: &[u8]) {
        let left = self.max_len.saturating_sub(self.buffer.len());
        if bytes.len() > left {
            self.overflowed = true;
        }
        self.buffer.extend_from_slice(&bytes[..bytes.len().min(left)]);
    }

    fn reserve(&mut self, additional: usize) {
        let left = self.max_len.saturating_sub(self.buffer.len());
        self.buffer.reserve(additional.min(left));
    }
}

/// Counts bytes without storing them
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthSink {
    length: u64,
}

impl LengthSink {
    /// Zero-length sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes offered so far
    pub fn length(&self) -> u64 {
        self.length
    }
}

impl Sink for LengthSink {
    fn push_byte(&mut self, _byte: u8) {
        self.length += 1;
    }

    fn append(&mut self, bytes: &[u8]) {
        self.length += bytes.len() as u64;
    }

    fn reserve(&mut self, _additional: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_size_constrained_sink_truncates() {
        let mut sink = SizeConstrainedSink::new(5);
        sink.append(b"abc");
        assert!(!sink.overflowed());
        sink.append(b"defg");
        sink.push_byte(b'h');
        assert!(sink.overflowed());
        assert_eq!(sink.as_bytes(), b"abcde");
    }

    #[test]
    fn test_length_sink_counts() {
        let mut sink = LengthSink::new();
        sink.append(b"null");
        sink.push_byte(b',');
        assert_eq!(sink.length(), 5);
    }

    #[test]
    fn test_stream_sink_writes_through() {
        let mut sink = StreamSink::new(Vec::new());
        sink.append(b"[1,");
        sink.push_byte(b'2');
        sink.push_byte(b']');
        assert_eq!(sink.finish().unwrap(), b"[1,2]");
    }

    #[test]
    fn test_stream_sink_reports_first_error() {
        let mut sink = StreamSink::new(FailingWriter);
        sink.append(&vec![b'x'; 64 * 1024]);
        sink.push_byte(b'y');
        assert!(matches!(sink.finish(), Err(VPackError::Io(_))));
    }

    #[test]
    fn test_string_sink() {
        let mut sink = StringSink::new();
        assert!(sink.is_empty());
        sink.append("mötör".as_bytes());
        assert_eq!(sink.len(), 7);
        assert_eq!(sink.into_string().unwrap(), "mötör");
    }
}
