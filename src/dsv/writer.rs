use std::fs::File;
use std::io;
use std::path::Path;

use memchr::{memchr, memchr3};

use crate::dsv::sanitize_delimiter;
use crate::error::Result;
use crate::sink::{Sink, WriteSink};

/// The quoting style to use when writing DSV data.
#[derive(Clone, Copy, Debug)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter or line
    /// terminator.
    ///
    /// This is the default.
    Necessary,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// Builds a DSV writer with various configuration knobs.
///
/// Once a writer is built, its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    delimiter: u8,
    style: QuoteStyle,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder { delimiter: b',', style: QuoteStyle::default() }
    }
}

impl WriterBuilder {
    /// Create a new builder.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing DSV.
    ///
    /// The default is `b','`. The quote character `b'"'` cannot be a
    /// delimiter and is coerced to `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The quoting style to use when writing DSV.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which only uses
    /// quotes when they are needed to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.style = style;
        self
    }

    /// Build a DSV writer from this configuration that writes to the sink
    /// given.
    pub fn from_sink<K: Sink>(&self, sink: K) -> Writer<K> {
        Writer {
            sink,
            delimiter: sanitize_delimiter(self.delimiter),
            style: self.style,
        }
    }

    /// Build a DSV writer from this configuration that writes to the
    /// `io::Write` given.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<WriteSink<W>> {
        self.from_sink(WriteSink::new(wtr))
    }

    /// Build a DSV writer from this configuration that writes to the file
    /// path given. The file is created if it does not exist and truncated
    /// otherwise.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Writer<WriteSink<File>>> {
        Ok(self.from_writer(File::create(path)?))
    }
}

/// A streaming DSV writer.
///
/// Quoting is handled on demand: a field is wrapped in quotes exactly when
/// it contains the delimiter, a quote, `\n` or `\r` (or always, under
/// `QuoteStyle::Always`), and embedded quotes are escaped by doubling.
/// Nothing else is escaped; in particular, line breaks inside a quoted
/// field pass through literally, and the reader in this crate decodes them
/// by scanning past line terminators while inside quotes.
///
/// One deviation from pure on-demand quoting: a row holding exactly one
/// empty field is written as `""`. Left bare it would serialize to a blank
/// line, and blank lines decode as rows with *zero* fields.
///
/// # Example
///
/// ```
/// use dsvxml::dsv;
///
/// # fn main() -> dsvxml::Result<()> {
/// let mut wtr = dsv::Writer::from_sink(Vec::new());
/// wtr.write_row(vec!["city", "pop"])?;
/// wtr.write_row(vec!["Davis, CA", "66850"])?;
/// let data = wtr.into_inner();
/// assert_eq!(data, b"city,pop\n\"Davis, CA\",66850\n".to_vec());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Writer<K> {
    sink: K,
    delimiter: u8,
    style: QuoteStyle,
}

impl<W: io::Write> Writer<WriteSink<W>> {
    /// Create a new DSV writer with a default configuration that writes to
    /// the `io::Write` given.
    pub fn from_writer(wtr: W) -> Writer<WriteSink<W>> {
        WriterBuilder::new().from_writer(wtr)
    }
}

impl Writer<WriteSink<File>> {
    /// Create a new DSV writer with a default configuration that writes to
    /// the file path given.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Writer<WriteSink<File>>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<K: Sink> Writer<K> {
    /// Create a new DSV writer with a default configuration that writes to
    /// the sink given.
    pub fn from_sink(sink: K) -> Writer<K> {
        WriterBuilder::new().from_sink(sink)
    }

    /// Write a single row.
    ///
    /// Fields are joined by exactly one delimiter, with no delimiter after
    /// the final field, and the row is terminated by a single `\n`. An
    /// empty row writes the terminator alone.
    ///
    /// A failed sink write aborts immediately; the sink may be left
    /// mid-field.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut count = 0;
        let mut last_len = 0;
        for field in row {
            let field = field.as_ref();
            if count > 0 {
                self.sink.put(self.delimiter)?;
            }
            count += 1;
            last_len = field.len();
            self.write_field(field.as_bytes())?;
        }
        if count == 1 && last_len == 0 {
            // A lone empty field must not collapse into a blank line (see
            // the type-level docs). Under `Always` it was quoted already.
            if let QuoteStyle::Necessary = self.style {
                self.sink.put_all(b"\"\"")?;
            }
        }
        self.sink.put(b'\n')?;
        Ok(())
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &K {
        &self.sink
    }

    /// Unwraps this writer, returning the underlying sink.
    pub fn into_inner(self) -> K {
        self.sink
    }

    fn write_field(&mut self, field: &[u8]) -> Result<()> {
        if self.should_quote(field) {
            self.write_quoted(field)
        } else {
            self.sink.put_all(field)?;
            Ok(())
        }
    }

    fn should_quote(&self, field: &[u8]) -> bool {
        match self.style {
            QuoteStyle::Always => true,
            QuoteStyle::Necessary => {
                memchr3(self.delimiter, b'"', b'\n', field).is_some()
                    || memchr(b'\r', field).is_some()
            }
        }
    }

    fn write_quoted(&mut self, field: &[u8]) -> Result<()> {
        self.sink.put(b'"')?;
        for &b in field {
            if b == b'"' {
                self.sink.put(b'"')?;
            }
            self.sink.put(b)?;
        }
        self.sink.put(b'"')?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{QuoteStyle, Writer, WriterBuilder};

    fn write_rows(
        builder: &WriterBuilder,
        rows: Vec<Vec<&str>>,
    ) -> String {
        let mut wtr = builder.from_sink(Vec::new());
        for row in rows {
            wtr.write_row(row).unwrap();
        }
        String::from_utf8(wtr.into_inner()).unwrap()
    }

    macro_rules! writes_as {
        ($name:ident, $rows:expr, $expected:expr) => {
            writes_as!($name, $rows, $expected, |_| ());
        };
        ($name:ident, $rows:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = WriterBuilder::new();
                $config(&mut builder);
                assert_eq!(write_rows(&builder, $rows), $expected);
            }
        };
    }

    writes_as!(plain, vec![vec!["a", "b", "c"]], "a,b,c\n");
    writes_as!(
        many_rows,
        vec![vec!["a", "b"], vec!["x", "y"]],
        "a,b\nx,y\n"
    );
    writes_as!(empty_row, vec![vec![]], "\n");
    writes_as!(empty_fields, vec![vec!["", ""]], ",\n");
    writes_as!(single_empty_field, vec![vec![""]], "\"\"\n");

    writes_as!(quotes_delimiter, vec![vec!["a,b", "c"]], "\"a,b\",c\n");
    writes_as!(quotes_quote, vec![vec!["a\"b"]], "\"a\"\"b\"\n");
    writes_as!(quotes_newline, vec![vec!["a\nb"]], "\"a\nb\"\n");
    writes_as!(quotes_carriage_return, vec![vec!["a\rb"]], "\"a\rb\"\n");
    writes_as!(no_gratuitous_quotes, vec![vec!["a b", "c'd"]], "a b,c'd\n");

    writes_as!(
        quote_all,
        vec![vec!["a", ""]],
        "\"a\",\"\"\n",
        |b: &mut WriterBuilder| {
            b.quote_style(QuoteStyle::Always);
        }
    );
    writes_as!(
        quote_all_single_empty,
        vec![vec![""]],
        "\"\"\n",
        |b: &mut WriterBuilder| {
            b.quote_style(QuoteStyle::Always);
        }
    );

    writes_as!(
        delimiter_semicolon,
        vec![vec!["a", "b;c"]],
        "a;\"b;c\"\n",
        |b: &mut WriterBuilder| {
            b.delimiter(b';');
        }
    );
    // With a semicolon delimiter a comma no longer needs quoting.
    writes_as!(
        delimiter_semicolon_comma_plain,
        vec![vec!["a,b"]],
        "a,b\n",
        |b: &mut WriterBuilder| {
            b.delimiter(b';');
        }
    );
    writes_as!(
        delimiter_quote_coerced,
        vec![vec!["a", "b"]],
        "a,b\n",
        |b: &mut WriterBuilder| {
            b.delimiter(b'"');
        }
    );

    #[test]
    fn write_row_ref() {
        use crate::row::Row;

        let row = Row::from(vec!["x", "y,z"]);
        let mut wtr = Writer::from_sink(Vec::new());
        wtr.write_row(&row).unwrap();
        assert_eq!(wtr.get_ref().as_slice(), b"x,\"y,z\"\n");
    }
}
