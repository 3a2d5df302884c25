use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;

use crate::error::{Error, Result};
use crate::source::{ReadSource, Source};
use crate::xml::token::{Attributes, Token};

/// A streaming XML reader.
///
/// Lexical scanning is delegated to the `quick-xml` engine; this reader is
/// a pull-based adapter over it. It drives the scanner only when its own
/// queue of decoded tokens is empty, captures the scanner's events into
/// that queue, and hands tokens out one at a time. Character runs made
/// entirely of blanks (formatting indentation) are dropped as they are
/// decoded, never enqueued.
///
/// A self-closing element on input is reported as a `Start` token
/// immediately followed by its `End`; the `Complete` token is a write-side
/// shorthand only.
///
/// A lexical error is sticky: once the scanner reports one, every
/// subsequent read fails with the same error without consuming further
/// input.
///
/// # Example
///
/// ```
/// use dsvxml::xml;
///
/// # fn main() -> dsvxml::Result<()> {
/// let data = "<trip> <node id=\"7\">Davis</node> </trip>";
/// let mut rdr = xml::Reader::from_source(data.as_bytes());
/// // Skipping character data yields only the structural tokens.
/// while let Some(token) = rdr.read_token(true)? {
///     assert!(!token.is_char_data());
/// }
/// # Ok(()) }
/// ```
pub struct Reader<S> {
    scanner: quick_xml::Reader<io::BufReader<Feed<S>>>,
    queue: VecDeque<Token>,
    buf: Vec<u8>,
    done: bool,
    fault: Option<quick_xml::Error>,
}

/// Adapts a `Source`'s bulk reads to the `io::Read` the scanner is fed
/// through.
struct Feed<S>(S);

impl<S: Source> io::Read for Feed<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: io::Read> Reader<ReadSource<R>> {
    /// Create a new XML reader that reads from the `io::Read` given.
    pub fn from_reader(rdr: R) -> Reader<ReadSource<R>> {
        Reader::from_source(ReadSource::new(rdr))
    }
}

impl Reader<ReadSource<File>> {
    /// Create a new XML reader that reads from the file path given.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Reader<ReadSource<File>>> {
        Ok(Reader::from_reader(File::open(path)?))
    }
}

impl<S: Source> Reader<S> {
    /// Create a new XML reader that reads from the source given.
    pub fn from_source(src: S) -> Reader<S> {
        let mut scanner =
            quick_xml::Reader::from_reader(io::BufReader::new(Feed(src)));
        // Surface `<x/>` as a start immediately followed by an end, the
        // same shape the write side lowers `Complete` to.
        scanner.expand_empty_elements(true);
        // An end tag that does not match its start is a lexical error.
        scanner.check_end_names(true);
        Reader {
            scanner,
            queue: VecDeque::new(),
            buf: Vec::new(),
            done: false,
            fault: None,
        }
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` only at true end of input with the queue
    /// drained. With `skip_char_data` set, character data tokens are
    /// discarded and the next structural token is returned instead, so
    /// callers that only care about document structure can ignore text
    /// nodes transparently.
    pub fn read_token(
        &mut self,
        skip_char_data: bool,
    ) -> Result<Option<Token>> {
        if let Some(ref err) = self.fault {
            return Err(Error::Xml(err.clone()));
        }
        loop {
            if let Some(token) = self.queue.pop_front() {
                if skip_char_data && token.is_char_data() {
                    continue;
                }
                return Ok(Some(token));
            }
            if self.done {
                return Ok(None);
            }
            self.pump()?;
        }
    }

    /// Returns true once the scanner has consumed all input and every
    /// buffered token has been handed out. A queue with buffered but
    /// unread tokens is not yet ended, even if no bytes remain.
    pub fn is_end(&self) -> bool {
        self.done && self.queue.is_empty()
    }

    /// Drive the scanner one event forward, enqueueing at most one token.
    fn pump(&mut self) -> Result<()> {
        self.buf.clear();
        let step: std::result::Result<(), quick_xml::Error> =
            match self.scanner.read_event_into(&mut self.buf) {
                Err(err) => Err(err),
                Ok(Event::Eof) => {
                    self.done = true;
                    Ok(())
                }
                Ok(Event::Start(ref e)) => match decode_start(e) {
                    Ok(token) => {
                        self.queue.push_back(token);
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                Ok(Event::End(ref e)) => {
                    self.queue.push_back(Token::End {
                        name: name_to_string(e.name()),
                    });
                    Ok(())
                }
                Ok(Event::Text(ref t)) => match t.unescape() {
                    Ok(text) => {
                        if !is_blank(&text) {
                            self.queue
                                .push_back(Token::CharData(text.into_owned()));
                        }
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                // CDATA is not modeled as its own entity; its contents are
                // plain character data, taken verbatim.
                Ok(Event::CData(ref cd)) => match str::from_utf8(cd) {
                    Ok(text) => {
                        if !is_blank(text) {
                            self.queue
                                .push_back(Token::CharData(text.to_string()));
                        }
                        Ok(())
                    }
                    Err(err) => {
                        Err(quick_xml::Error::NonDecodable(Some(err)))
                    }
                },
                // Declarations, comments, processing instructions and
                // doctypes are outside the modeled dialect.
                Ok(Event::Decl(_))
                | Ok(Event::Comment(_))
                | Ok(Event::PI(_))
                | Ok(Event::DocType(_))
                | Ok(Event::Empty(_)) => Ok(()),
            };
        if let Err(err) = step {
            self.fault = Some(err.clone());
            return Err(Error::Xml(err));
        }
        Ok(())
    }
}

fn name_to_string(name: QName) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

fn decode_start(
    start: &BytesStart,
) -> std::result::Result<Token, quick_xml::Error> {
    let name = name_to_string(start.name());
    let mut attrs = Attributes::new();
    // Duplicate attribute names are kept in declaration order, so the
    // iterator's duplicate check must be off.
    let mut raw = start.attributes();
    raw.with_checks(false);
    for attr in raw {
        let attr = attr?;
        let value = attr.unescape_value()?;
        attrs.push(&String::from_utf8_lossy(attr.key.as_ref()), &value);
    }
    Ok(Token::Start { name, attrs })
}

fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| match b {
        b' ' | b'\t' | b'\n' | b'\r' => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::xml::token::Token;

    use super::Reader;

    fn read_all(data: &str, skip_char_data: bool) -> Vec<Token> {
        let mut rdr = Reader::from_source(data.as_bytes());
        let mut tokens = vec![];
        while let Some(token) = rdr.read_token(skip_char_data).unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn skip_char_data_yields_structure_only() {
        let tokens = read_all("<test> <inner>Hello</inner> </test>", true);
        assert_eq!(
            tokens,
            vec![
                Token::start("test"),
                Token::start("inner"),
                Token::end("inner"),
                Token::end("test"),
            ]
        );
    }

    #[test]
    fn char_data_kept_blank_runs_dropped() {
        let tokens = read_all("<test> <inner>Hello</inner> </test>", false);
        assert_eq!(
            tokens,
            vec![
                Token::start("test"),
                Token::start("inner"),
                Token::char_data("Hello"),
                Token::end("inner"),
                Token::end("test"),
            ]
        );
    }

    #[test]
    fn self_closing_expands_to_start_end() {
        let tokens = read_all("<a><b/></a>", false);
        assert_eq!(
            tokens,
            vec![
                Token::start("a"),
                Token::start("b"),
                Token::end("b"),
                Token::end("a"),
            ]
        );
    }

    #[test]
    fn attributes_decoded_in_order() {
        let tokens =
            read_all(r#"<n id="1" id="2" name="x&amp;y"></n>"#, false);
        let attrs = tokens[0].attributes().unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("id"), Some("1"));
        assert_eq!(attrs.get("name"), Some("x&y"));
        let pairs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("id", "1"), ("id", "2"), ("name", "x&y")]
        );
    }

    #[test]
    fn entities_unescaped_in_text() {
        let tokens = read_all("<a>x &lt; y &amp; z</a>", false);
        assert_eq!(tokens[1], Token::char_data("x < y & z"));
    }

    #[test]
    fn cdata_folds_into_char_data() {
        let tokens = read_all("<a><![CDATA[x < y]]></a>", false);
        assert_eq!(tokens[1], Token::char_data("x < y"));
    }

    #[test]
    fn declarations_and_comments_skipped() {
        let tokens =
            read_all("<?xml version=\"1.0\"?><!-- hi --><a></a>", false);
        assert_eq!(tokens, vec![Token::start("a"), Token::end("a")]);
    }

    #[test]
    fn lexical_error_is_sticky() {
        let mut rdr = Reader::from_source(&b"<a>text</b>"[..]);
        assert_eq!(
            rdr.read_token(false).unwrap(),
            Some(Token::start("a"))
        );
        assert_eq!(
            rdr.read_token(false).unwrap(),
            Some(Token::char_data("text"))
        );
        let first = rdr.read_token(false);
        match first {
            Err(Error::Xml(_)) => {}
            result => panic!("expected lexical error, got {:?}", result),
        }
        // The failure replays on every subsequent read.
        match rdr.read_token(false) {
            Err(Error::Xml(_)) => {}
            result => panic!("expected sticky error, got {:?}", result),
        }
        assert!(!rdr.is_end());
    }

    #[test]
    fn end_state() {
        let mut rdr = Reader::from_source(&b"<a></a>"[..]);
        assert!(!rdr.is_end());
        assert!(rdr.read_token(false).unwrap().is_some());
        assert!(rdr.read_token(false).unwrap().is_some());
        assert!(rdr.read_token(false).unwrap().is_none());
        assert!(rdr.is_end());
        // Reading past the end keeps failing softly, not with an error.
        assert!(rdr.read_token(false).unwrap().is_none());
    }

    #[test]
    fn blank_only_document_text() {
        let tokens = read_all("<a>   \n\t  </a>", false);
        assert_eq!(tokens, vec![Token::start("a"), Token::end("a")]);
    }
}
