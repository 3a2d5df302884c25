use std::fs::File;
use std::io;
use std::path::Path;
use std::str;

use crate::dsv::sanitize_delimiter;
use crate::error::{Error, Result, Utf8Error};
use crate::row::Row;
use crate::source::{ReadSource, Source};

/// Builds a DSV reader with various configuration knobs.
///
/// Once a reader is built, its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    delimiter: u8,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { delimiter: b',' }
    }
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when parsing DSV.
    ///
    /// The default is `b','`. The quote character `b'"'` cannot be a
    /// delimiter and is coerced to `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Build a DSV reader from this configuration that reads from the
    /// source given.
    pub fn from_source<S: Source>(&self, src: S) -> Reader<S> {
        Reader {
            src,
            delimiter: sanitize_delimiter(self.delimiter),
            field: Vec::new(),
        }
    }

    /// Build a DSV reader from this configuration that reads from the
    /// `io::Read` given.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<ReadSource<R>> {
        self.from_source(ReadSource::new(rdr))
    }

    /// Build a DSV reader from this configuration that reads from the file
    /// path given.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Reader<ReadSource<File>>> {
        Ok(self.from_reader(File::open(path)?))
    }
}

/// A streaming DSV reader.
///
/// This reader decodes one row at a time from a byte source, one character
/// of lookahead at a time, so quoted fields may span multiple lines without
/// any row-level buffering of the input.
///
/// # Format
///
/// The accepted syntax is RFC 4180-like, with the lenient-consumer
/// tradition of CSV parsers: this reader never raises a syntax error and
/// always finds *a* parse. In particular:
///
/// * `\r`, `\n` and any run of the two together terminate a row.
/// * Whitespace ahead of a field's opening quote is dropped; whitespace
///   inside quotes is preserved exactly.
/// * A quote appearing mid-field switches into quoted mode, so `"a"b`
///   decodes as `ab`.
/// * A quote left unterminated at end of input is treated as implicitly
///   closed.
/// * A trailing delimiter introduces a final empty field: `a,b,` decodes
///   as `["a", "b", ""]`.
///
/// # Example
///
/// ```
/// use dsvxml::dsv;
/// use dsvxml::Row;
///
/// # fn main() -> dsvxml::Result<()> {
/// let data = "city,pop\n\"Davis, CA\",66850\n";
/// let mut rdr = dsv::Reader::from_reader(data.as_bytes());
/// let mut row = Row::new();
/// assert!(rdr.read_row(&mut row)?);
/// assert_eq!(row, vec!["city", "pop"]);
/// assert!(rdr.read_row(&mut row)?);
/// assert_eq!(row, vec!["Davis, CA", "66850"]);
/// assert!(!rdr.read_row(&mut row)?);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Reader<S> {
    src: S,
    delimiter: u8,
    /// Scratch buffer holding the bytes of the field being decoded.
    field: Vec<u8>,
}

impl<R: io::Read> Reader<ReadSource<R>> {
    /// Create a new DSV reader with a default configuration that reads
    /// from the `io::Read` given.
    pub fn from_reader(rdr: R) -> Reader<ReadSource<R>> {
        ReaderBuilder::new().from_reader(rdr)
    }
}

impl Reader<ReadSource<File>> {
    /// Create a new DSV reader with a default configuration that reads
    /// from the file path given.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Reader<ReadSource<File>>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<S: Source> Reader<S> {
    /// Create a new DSV reader with a default configuration that reads
    /// from the source given.
    pub fn from_source(src: S) -> Reader<S> {
        ReaderBuilder::new().from_source(src)
    }

    /// Returns true once the underlying source is exhausted.
    pub fn is_end(&mut self) -> Result<bool> {
        Ok(self.src.is_end()?)
    }

    /// Read a single row into `row`.
    ///
    /// Returns `Ok(true)` when a row was read, even an empty one (a blank
    /// line decodes as a row with zero fields). Returns `Ok(false)` only
    /// at true end of input with nothing left to return, which is how "no
    /// more rows" is distinguished from an empty row.
    pub fn read_row(&mut self, row: &mut Row) -> Result<bool> {
        row.clear();
        match self.src.peek()? {
            None => return Ok(false),
            Some(b) if is_line_term(b) => {
                // A run of line terminators is one blank line.
                self.consume_line_terms()?;
                return Ok(true);
            }
            Some(_) => {}
        }
        loop {
            let produced = self.read_field()?;
            if produced {
                match str::from_utf8(&self.field) {
                    Ok(field) => row.push_field(field),
                    Err(err) => {
                        return Err(Error::Utf8(Utf8Error::new(
                            row.len(),
                            err.valid_up_to(),
                        )));
                    }
                }
            } else {
                // Field extraction came up empty-handed at end of input,
                // which can only happen right after a delimiter: the row
                // ends with a final empty field.
                row.push_field("");
                return Ok(true);
            }
            match self.src.peek()? {
                None => return Ok(true),
                Some(b) if is_line_term(b) => {
                    self.consume_line_terms()?;
                    return Ok(true);
                }
                // Anything else is the delimiter the field stopped at.
                Some(_) => {
                    self.src.get()?;
                }
            }
        }
    }

    /// Decode one field into the scratch buffer.
    ///
    /// The terminating delimiter or line terminator is left unconsumed so
    /// the row loop can tell field-end from row-end. Returns false only
    /// when nothing was consumed and the input is exhausted; every other
    /// outcome is a field, including an empty one.
    fn read_field(&mut self) -> Result<bool> {
        self.field.clear();
        let mut consumed = false;
        let mut in_quotes = false;

        // Blanks ahead of the field (or of its opening quote) are never
        // part of unquoted content.
        while let Some(b) = self.src.peek()? {
            if b != b' ' && b != b'\t' {
                break;
            }
            self.src.get()?;
            consumed = true;
        }
        if let Some(b'"') = self.src.peek()? {
            self.src.get()?;
            consumed = true;
            in_quotes = true;
        }
        loop {
            let b = match self.src.peek()? {
                // End of input; an open quote is implicitly closed.
                None => break,
                Some(b) => b,
            };
            if in_quotes {
                self.src.get()?;
                consumed = true;
                if b == b'"' {
                    if self.src.peek()? == Some(b'"') {
                        // A doubled quote is one literal quote.
                        self.src.get()?;
                        self.field.push(b'"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    self.field.push(b);
                }
            } else {
                if b == self.delimiter || is_line_term(b) {
                    break;
                }
                self.src.get()?;
                consumed = true;
                if b == b'"' {
                    in_quotes = true;
                } else {
                    self.field.push(b);
                }
            }
        }
        if !consumed && self.src.is_end()? {
            return Ok(false);
        }
        Ok(true)
    }

    fn consume_line_terms(&mut self) -> Result<()> {
        while let Some(b) = self.src.peek()? {
            if !is_line_term(b) {
                break;
            }
            self.src.get()?;
        }
        Ok(())
    }
}

fn is_line_term(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::row::Row;

    use super::{Reader, ReaderBuilder};

    fn read_all(rdr: &mut Reader<&[u8]>) -> Vec<Vec<String>> {
        let mut rows = vec![];
        let mut row = Row::new();
        while rdr.read_row(&mut row).unwrap() {
            rows.push(row.iter().map(str::to_string).collect());
        }
        rows
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |_| ());
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ReaderBuilder::new();
                $config(&mut builder);
                let mut rdr = builder.from_source($data.as_bytes());
                let got = read_all(&mut rdr);
                let expected: Vec<Vec<&str>> = $expected;
                assert_eq!(got, expected);
            }
        };
    }

    parses_to!(one_row_one_field, "a", vec![vec!["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", vec![vec!["a", "b", "c"]]);
    parses_to!(one_row_lf, "a,b,c\n", vec![vec!["a", "b", "c"]]);
    parses_to!(one_row_crlf, "a,b,c\r\n", vec![vec!["a", "b", "c"]]);
    parses_to!(
        many_rows,
        "a,b\nx,y\n",
        vec![vec!["a", "b"], vec!["x", "y"]]
    );
    parses_to!(many_rows_cr, "a\rb\r", vec![vec!["a"], vec!["b"]]);

    parses_to!(empty, "", vec![]);
    parses_to!(empty_field_middle, "a,,c\n", vec![vec!["a", "", "c"]]);
    parses_to!(empty_fields_only, ",", vec![vec!["", ""]]);
    parses_to!(trailing_delim, "a,b,", vec![vec!["a", "b", ""]]);
    parses_to!(trailing_delim_lf, "a,b,\n", vec![vec!["a", "b", ""]]);

    // A blank line is an empty row; the whole terminator run belongs to it.
    parses_to!(blank_line, "\n", vec![vec![]]);
    parses_to!(leading_blank_lines, "\n\na,b", vec![vec![], vec!["a", "b"]]);
    // Terminator runs after a data row are consumed with that row.
    parses_to!(
        interior_blank_lines,
        "a\n\n\nb\n",
        vec![vec!["a"], vec!["b"]]
    );

    parses_to!(
        quoted_specials,
        "\"a,b\",\"c\"\"d\",\"e\nf\"\n",
        vec![vec!["a,b", "c\"d", "e\nf"]]
    );
    parses_to!(quoted_multiline, "\"a\nb\",c\n", vec![vec!["a\nb", "c"]]);
    parses_to!(quoted_delim_only, "\",\",x", vec![vec![",", "x"]]);
    parses_to!(mixed_quoting, "\"a\"b,c", vec![vec!["ab", "c"]]);
    parses_to!(quote_mid_field, "ab\"c,d\"e", vec![vec!["abc,de"]]);
    parses_to!(unterminated_quote, "\"abc", vec![vec!["abc"]]);
    parses_to!(quote_empty, "\"\"", vec![vec![""]]);

    parses_to!(blanks_before_quote, "  \"a\",b", vec![vec!["a", "b"]]);
    parses_to!(blanks_inside_quotes, "\" a \"", vec![vec![" a "]]);
    parses_to!(blanks_only, "  ", vec![vec![""]]);
    parses_to!(tab_before_field, "\ta,b", vec![vec!["a", "b"]]);

    parses_to!(
        delimiter_semicolon,
        "a;b\nc;d\n",
        vec![vec!["a", "b"], vec!["c", "d"]],
        |b: &mut ReaderBuilder| {
            b.delimiter(b';');
        }
    );
    // Asking for the quote character as delimiter falls back to a comma.
    parses_to!(
        delimiter_quote_coerced,
        "a,b\n",
        vec![vec!["a", "b"]],
        |b: &mut ReaderBuilder| {
            b.delimiter(b'"');
        }
    );

    parses_to!(multibyte_utf8, "héllo,wörld\n", vec![vec!["héllo", "wörld"]]);

    #[test]
    fn empty_row_then_end() {
        let mut rdr = Reader::from_source(&b"\n"[..]);
        let mut row = Row::new();
        assert!(rdr.read_row(&mut row).unwrap());
        assert!(row.is_empty());
        assert!(!rdr.read_row(&mut row).unwrap());
        assert!(rdr.is_end().unwrap());
    }

    #[test]
    fn is_end_tracks_input() {
        let mut rdr = Reader::from_source(&b"a\n"[..]);
        assert!(!rdr.is_end().unwrap());
        let mut row = Row::new();
        assert!(rdr.read_row(&mut row).unwrap());
        assert!(rdr.is_end().unwrap());
    }

    #[test]
    fn invalid_utf8_field() {
        let mut rdr = Reader::from_source(&b"ok,\xffbad\n"[..]);
        let mut row = Row::new();
        match rdr.read_row(&mut row) {
            Err(Error::Utf8(err)) => assert_eq!(err.field(), 1),
            result => panic!("expected utf-8 error, got {:?}", result),
        }
    }
}
