use std::io;

/// A push-based byte sink consumed by the codecs in this crate.
///
/// Sinks are append-only and may fail (a closed stream, a full pipe); a
/// failed `put` aborts the operation that issued it.
pub trait Sink {
    /// Appends one byte to the sink.
    fn put(&mut self, byte: u8) -> io::Result<()>;

    /// Appends every byte of `bytes` to the sink.
    fn put_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.put(byte)?;
        }
        Ok(())
    }
}

/// In-memory buffers are sinks that never fail.
impl Sink for Vec<u8> {
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }

    fn put_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// A `Sink` over any `io::Write`.
///
/// No buffering is added here; wrap the writer in `io::BufWriter` when the
/// byte-at-a-time write pattern would otherwise hit the underlying stream
/// directly.
#[derive(Debug)]
pub struct WriteSink<W> {
    inner: W,
}

impl<W: io::Write> WriteSink<W> {
    /// Creates a new `WriteSink` that appends to the writer given.
    pub fn new(inner: W) -> WriteSink<W> {
        WriteSink { inner }
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps this `WriteSink`, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Sink for WriteSink<W> {
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])
    }

    fn put_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{Sink, WriteSink};

    #[test]
    fn vec_sink() {
        let mut sink = Vec::new();
        sink.put(b'a').unwrap();
        sink.put_all(b"bc").unwrap();
        assert_eq!(sink, b"abc");
    }

    #[test]
    fn write_sink() {
        let mut sink = WriteSink::new(Vec::new());
        sink.put(b'x').unwrap();
        sink.put_all(b"yz").unwrap();
        assert_eq!(sink.into_inner(), b"xyz");
    }
}
