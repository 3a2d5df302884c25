use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, dsvxml::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when encoding or decoding DSV or XML data.
#[derive(Debug)]
pub enum Error {
    /// An I/O error raised by the underlying byte source or sink.
    ///
    /// A write that fails part way through leaves the output mid-field or
    /// mid-tag; no rollback is attempted for bytes already written.
    Io(io::Error),
    /// A decoded DSV field was not valid UTF-8.
    Utf8(Utf8Error),
    /// A lexical error reported by the XML scanner.
    ///
    /// Once a reader has returned this error, every subsequent read on the
    /// same reader fails with it again without consuming further input.
    Xml(quick_xml::Error),
    /// An end tag was written that does not close the innermost currently
    /// open element. Nothing is emitted and the writer state is untouched.
    UnmatchedClose {
        /// The name in the offending end tag.
        found: String,
        /// The innermost open element, if any element is open at all.
        expected: Option<String>,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8(ref err) => Some(err),
            Error::Xml(ref err) => Some(err),
            Error::UnmatchedClose { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8(ref err) => {
                write!(f, "DSV parse error: {}", err)
            }
            Error::Xml(ref err) => {
                write!(f, "XML parse error: {}", err)
            }
            Error::UnmatchedClose { ref found, expected: Some(ref open) } => {
                write!(
                    f,
                    "XML write error: end tag </{}> does not close the \
                     innermost open element <{}>",
                    found, open)
            }
            Error::UnmatchedClose { ref found, expected: None } => {
                write!(
                    f,
                    "XML write error: end tag </{}> written with no \
                     element open",
                    found)
            }
        }
    }
}

/// A UTF-8 validation error for a single decoded field.
///
/// The error includes the index of the field within its row and the last
/// byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    field: usize,
    valid_up_to: usize,
}

impl Utf8Error {
    pub(crate) fn new(field: usize, valid_up_to: usize) -> Utf8Error {
        Utf8Error { field, valid_up_to }
    }

    /// The index of the field within its row at which validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8 in field {} near byte index {}",
            self.field, self.valid_up_to)
    }
}

impl error::Error for Utf8Error {}
