// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::decoder::PropertyKind;

/// Which boundary detected an odd number of quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteScope {
    /// Detected when a delimiter closed the field.
    Field,
    /// Detected when a line terminator (or end of input) closed the record.
    Line,
}

impl core::fmt::Display for QuoteScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QuoteScope::Field => f.write_str("field"),
            QuoteScope::Line => f.write_str("line"),
        }
    }
}

/// The reason a document was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Something other than whitespace (or the literal marker) preceded an opening quote.
    #[error("odd characters before the starting quote")]
    CharsBeforeQuote,
    /// A field or line ended while a quoted value was still open.
    #[error("incorrect number of quotes at {0} end")]
    QuoteCountMismatch(QuoteScope),
    /// A record disagreed with record 0 about the number of fields.
    #[error("incorrect number of fields: found {found} but expected {expected}")]
    FieldCountMismatch { expected: usize, found: usize },
    /// A byte other than whitespace, a delimiter or a line terminator followed a closing quote.
    #[error("found extraneous character 0x{0:02x} after a closing quote")]
    ExtraneousCharacter(u8),
    /// A field was not valid UTF-8.
    #[error("could not create string: {0}")]
    InvalidUtf8(#[from] core::str::Utf8Error),
    /// A non-printing byte appeared outside a position where it is structural.
    #[error("non-printing character 0x{0:02x}")]
    ControlCharacter(u8),
    /// The decoder could not be built from the header row.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A data record could not be decoded into the target type.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A terminal parse failure, tagged with the 0-based record (line) index where it was detected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record {record}: {kind}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub record: usize,
}

impl ParseError {
    pub fn new(kind: impl Into<ErrorKind>, record: usize) -> Self {
        Self {
            kind: kind.into(),
            record,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// Errors raised while building or binding a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The default instance could not be encoded.
    #[error("could not encode the default instance: {0}")]
    Encode(String),
    /// The default instance did not encode to an object.
    #[error("the default instance must encode to an object, found {0}")]
    NotAnObject(&'static str),
    /// A coding key names a property the default instance does not have.
    #[error("property {0:?} has no default value")]
    MissingDefault(String),
    /// A default value is not a string, number or boolean.
    #[error("property {property:?} has an unsupported default ({found})")]
    UnsupportedDefault { property: String, found: &'static str },
    /// A column header is not mapped to any property.
    #[error("column header {0:?} is not mapped to a property")]
    UnmappedHeader(String),
    /// The same column header appears twice.
    #[error("column header {0:?} appears more than once")]
    DuplicateHeader(String),
}

/// Errors raised while decoding one data record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A scanned value could not be converted to the property's kind.
    #[error("record {record}: value {value:?} for property {property:?} is not a valid {kind}")]
    Coercion {
        record: usize,
        property: String,
        value: String,
        kind: PropertyKind,
    },
    /// The caller's decode routine rejected the assembled value.
    #[error("record {record}: {message}")]
    Rejected { record: usize, message: String },
}

/// Errors raised while building a [`CsvConfig`](crate::CsvConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Trimming would eat tab delimiters.
    #[error("whitespace trimming cannot be combined with a tab delimiter")]
    TrimWithTabDelimiter,
    /// The delimiter collides with a structural byte or is not printable ASCII.
    #[error("byte 0x{0:02x} cannot be used as a delimiter")]
    InvalidDelimiter(u8),
    /// The comment marker collides with a structural byte or the delimiter.
    #[error("byte 0x{0:02x} cannot be used as a comment marker")]
    InvalidCommentMarker(u8),
}
