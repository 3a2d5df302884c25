use std::io;

/// The default buffer size used by `ReadSource`.
const DEFAULT_BUF_SIZE: usize = 8 * 1024;

/// A pull-based byte source consumed by the codecs in this crate.
///
/// A source hands out one byte at a time with single-byte lookahead, plus a
/// bulk read used to feed the XML scanner. End of input is signaled by
/// `Ok(None)` (or a zero-length bulk read), which is distinct from an I/O
/// error; any blocking behavior lives entirely in the implementation.
pub trait Source {
    /// Returns the next byte without consuming it.
    fn peek(&mut self) -> io::Result<Option<u8>>;

    /// Consumes and returns the next byte.
    fn get(&mut self) -> io::Result<Option<u8>>;

    /// Reads up to `buf.len()` bytes into `buf`, returning how many were
    /// read. Zero means end of input (unless `buf` is empty).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns true at true end of input, with nothing left to consume.
    fn is_end(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }
}

/// In-memory byte slices are sources; the slice is advanced as bytes are
/// consumed, the same way `io::Read` is implemented for `&[u8]`.
impl<'a> Source for &'a [u8] {
    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.first().copied())
    }

    fn get(&mut self) -> io::Result<Option<u8>> {
        match (*self).split_first() {
            Some((&byte, rest)) => {
                *self = rest;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }
}

/// A `Source` over any `io::Read`, with an internal buffer providing the
/// single-byte lookahead that `peek` requires.
///
/// It can be excessively inefficient to work directly with a `Read`
/// instance one byte at a time. For example, every call to `read` on
/// `TcpStream` results in a system call. A `ReadSource` performs large,
/// infrequent reads on the underlying `Read` and serves `peek`/`get` out
/// of the in-memory buffer.
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    cap: usize,
    eof: bool,
}

impl<R: io::Read> ReadSource<R> {
    /// Creates a new `ReadSource` with a default buffer capacity.
    pub fn new(inner: R) -> ReadSource<R> {
        ReadSource::with_capacity(DEFAULT_BUF_SIZE, inner)
    }

    /// Creates a new `ReadSource` with the specified buffer capacity.
    pub fn with_capacity(cap: usize, inner: R) -> ReadSource<R> {
        ReadSource {
            inner,
            buf: vec![0; cap.max(1)],
            pos: 0,
            cap: 0,
            eof: false,
        }
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps this `ReadSource`, returning the underlying reader.
    ///
    /// Note that any leftover data in the internal buffer is lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Ensures the buffer is non-empty or the reader is exhausted, and
    /// returns the number of buffered bytes available.
    fn fill(&mut self) -> io::Result<usize> {
        if self.pos < self.cap {
            return Ok(self.cap - self.pos);
        }
        if self.eof {
            return Ok(0);
        }
        self.pos = 0;
        self.cap = loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => break n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        };
        if self.cap == 0 {
            self.eof = true;
        }
        Ok(self.cap)
    }
}

impl<R: io::Read> Source for ReadSource<R> {
    fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.fill()? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    fn get(&mut self) -> io::Result<Option<u8>> {
        if self.fill()? == 0 {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let available = self.fill()?;
        if available == 0 {
            return Ok(0);
        }
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
