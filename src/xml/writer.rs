use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::sink::{Sink, WriteSink};
use crate::xml::token::{Attributes, Token};

/// A streaming XML writer.
///
/// The writer tracks the names of currently open elements on a stack: a
/// `Start` token pushes, an `End` token must name the innermost open
/// element or it is rejected with nothing written. Because of that check,
/// the bytes written so far, together with the closes that [`flush`]
/// would force, always form a properly nested XML fragment; crossing
/// tags cannot be emitted.
///
/// Writers own their element stack exclusively and are movable but not
/// clonable.
///
/// [`flush`]: #method.flush
///
/// # Example
///
/// ```
/// use dsvxml::xml::{self, Token};
///
/// # fn main() -> dsvxml::Result<()> {
/// let mut wtr = xml::Writer::from_sink(Vec::new());
/// wtr.write_token(&Token::start("note"))?;
/// wtr.write_token(&Token::char_data("fish & chips"))?;
/// wtr.flush()?;
/// assert_eq!(wtr.into_inner(), b"<note>fish &amp; chips</note>".to_vec());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Writer<K> {
    sink: K,
    /// Names of the currently open elements, innermost last.
    stack: Vec<String>,
}

impl<W: io::Write> Writer<WriteSink<W>> {
    /// Create a new XML writer that writes to the `io::Write` given.
    pub fn from_writer(wtr: W) -> Writer<WriteSink<W>> {
        Writer::from_sink(WriteSink::new(wtr))
    }
}

impl Writer<WriteSink<File>> {
    /// Create a new XML writer that writes to the file path given. The
    /// file is created if it does not exist and truncated otherwise.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Writer<WriteSink<File>>> {
        Ok(Writer::from_writer(File::create(path)?))
    }
}

impl<K: Sink> Writer<K> {
    /// Create a new XML writer that writes to the sink given.
    pub fn from_sink(sink: K) -> Writer<K> {
        Writer { sink, stack: Vec::new() }
    }

    /// Write a single token.
    ///
    /// An `End` token that does not name the innermost open element fails
    /// with [`Error::UnmatchedClose`], writing nothing and leaving the
    /// writer state untouched. A failed sink write aborts immediately and
    /// may leave the output mid-tag.
    ///
    /// [`Error::UnmatchedClose`]: ../enum.Error.html#variant.UnmatchedClose
    pub fn write_token(&mut self, token: &Token) -> Result<()> {
        match *token {
            Token::Start { ref name, ref attrs } => {
                self.sink.put(b'<')?;
                self.sink.put_all(name.as_bytes())?;
                self.write_attrs(attrs)?;
                self.sink.put(b'>')?;
                self.stack.push(name.clone());
                Ok(())
            }
            Token::End { ref name } => {
                // An end tag may only close the innermost open element.
                match self.stack.last() {
                    Some(open) if open == name => {}
                    open => {
                        return Err(Error::UnmatchedClose {
                            found: name.clone(),
                            expected: open.cloned(),
                        });
                    }
                }
                self.sink.put_all(b"</")?;
                self.sink.put_all(name.as_bytes())?;
                self.sink.put(b'>')?;
                self.stack.pop();
                Ok(())
            }
            Token::CharData(ref text) => self.write_escaped(text),
            Token::Complete { ref name, ref attrs } => {
                self.sink.put(b'<')?;
                self.sink.put_all(name.as_bytes())?;
                self.write_attrs(attrs)?;
                self.sink.put_all(b"/>")?;
                Ok(())
            }
        }
    }

    /// Close every element still open, innermost first, draining the
    /// element stack.
    ///
    /// This forces a well-formed document when the caller stops short of
    /// explicitly closing everything it opened. With nothing open it is a
    /// no-op, so calling it twice is harmless.
    pub fn flush(&mut self) -> Result<()> {
        while let Some(name) = self.stack.last() {
            self.sink.put_all(b"</")?;
            self.sink.put_all(name.as_bytes())?;
            self.sink.put(b'>')?;
            self.stack.pop();
        }
        Ok(())
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &K {
        &self.sink
    }

    /// Unwraps this writer, returning the underlying sink.
    ///
    /// Elements still open are *not* closed first; call [`flush`] when a
    /// well-formed document is wanted.
    ///
    /// [`flush`]: #method.flush
    pub fn into_inner(self) -> K {
        self.sink
    }

    fn write_attrs(&mut self, attrs: &Attributes) -> Result<()> {
        for attr in attrs {
            self.sink.put(b' ')?;
            self.sink.put_all(attr.name.as_bytes())?;
            self.sink.put_all(b"=\"")?;
            self.write_escaped(&attr.value)?;
            self.sink.put(b'"')?;
        }
        Ok(())
    }

    /// Write text with the five predefined entities escaped. The same
    /// routine encodes character data and attribute values.
    fn write_escaped(&mut self, text: &str) -> Result<()> {
        for &b in text.as_bytes() {
            match b {
                b'<' => self.sink.put_all(b"&lt;")?,
                b'>' => self.sink.put_all(b"&gt;")?,
                b'&' => self.sink.put_all(b"&amp;")?,
                b'\'' => self.sink.put_all(b"&apos;")?,
                b'"' => self.sink.put_all(b"&quot;")?,
                _ => self.sink.put(b)?,
            }
        }
        Ok(())
    }
}
