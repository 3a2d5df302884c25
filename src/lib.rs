/*!
Streaming codecs for two textual wire formats: delimiter-separated values
(DSV, a CSV superset with a configurable delimiter) and a restricted XML
dialect exposed as a flat token stream rather than a DOM tree.

Both codecs read and write through abstract byte [`Source`]s and [`Sink`]s
one character of lookahead at a time, so they work the same over files,
in-memory buffers and sockets, and handle embedded delimiters, embedded
quotes and embedded line breaks without buffering whole documents.

# Reading and writing DSV

```
use dsvxml::dsv;
use dsvxml::Row;

# fn main() -> dsvxml::Result<()> {
let mut wtr = dsv::Writer::from_sink(Vec::new());
wtr.write_row(vec!["word", "dist"])?;
wtr.write_row(vec!["sticker, blue", "7"])?;
let data = wtr.into_inner();
assert_eq!(data, b"word,dist\n\"sticker, blue\",7\n".to_vec());

let mut rdr = dsv::Reader::from_reader(&*data);
let mut row = Row::new();
assert!(rdr.read_row(&mut row)?);
assert_eq!(row, vec!["word", "dist"]);
assert!(rdr.read_row(&mut row)?);
assert_eq!(row, vec!["sticker, blue", "7"]);
assert!(!rdr.read_row(&mut row)?);
# Ok(()) }
```

# Reading and writing XML tokens

```
use dsvxml::xml::{self, Token};

# fn main() -> dsvxml::Result<()> {
let mut wtr = xml::Writer::from_sink(Vec::new());
wtr.write_token(&Token::start("route"))?;
wtr.write_token(&Token::complete("stop"))?;
// Close everything still open.
wtr.flush()?;
assert_eq!(wtr.into_inner(), b"<route><stop/></route>".to_vec());
# Ok(()) }
```
*/

pub use crate::error::{Error, Result, Utf8Error};
pub use crate::row::{Row, RowIter};
pub use crate::sink::{Sink, WriteSink};
pub use crate::source::{ReadSource, Source};

mod error;
mod row;
mod sink;
mod source;

pub mod dsv;
pub mod xml;
