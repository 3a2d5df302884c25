/*!
Streaming reader and writer for a restricted XML dialect.

Rather than a DOM tree, XML data is exposed as a flat stream of tokens:
start tags with their attributes, end tags, character data and (on the
write side) self-closing elements. DTDs, namespaces, processing
instructions and entity references beyond the five predefined escapes are
not modeled.
*/

pub use self::reader::Reader;
pub use self::token::{Attribute, Attributes, Token};
pub use self::writer::Writer;

mod reader;
mod token;
mod writer;
