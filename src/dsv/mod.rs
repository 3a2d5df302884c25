/*!
Streaming reader and writer for delimiter-separated values.

DSV is a superset of CSV: the field separator is any single byte (comma by
default) while the quote character is fixed at `"`. Quoted fields may embed
the delimiter, doubled quotes and line breaks; rows are terminated by `\n`
(the reader also consumes `\r`).
*/

pub use self::reader::{Reader, ReaderBuilder};
pub use self::writer::{QuoteStyle, Writer, WriterBuilder};

mod reader;
mod writer;

/// Field delimiters can never be the quote character. A `"` delimiter is
/// silently coerced to a comma, the default.
fn sanitize_delimiter(delimiter: u8) -> u8 {
    if delimiter == b'"' {
        b','
    } else {
        delimiter
    }
}
