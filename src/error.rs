use std::error::Error as StdError;
use std::io;
use std::result;

use csv_stream_core::{ReadError, ReadErrorKind, WriteError};
use thiserror::Error;

use crate::byte_record::{ByteRecord, Position};

/// A type alias for `Result<T, csv_stream::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when decoding or encoding CSV data.
///
/// Every error is fatal to the codec that reports it. A handler sees exactly
/// one error, and the codec closes right after.
#[derive(Debug, Error)]
pub enum Error {
    /// The buffered bytes violate the CSV grammar.
    #[error(
        "CSV parse error: record {} (byte {}, line {}): {kind}",
        .pos.record(), .pos.byte(), .pos.line()
    )]
    Decode {
        /// The position of the start of the offending record.
        pos: Position,
        /// What was wrong with it.
        kind: DecodeErrorKind,
    },
    /// More bytes were buffered than the configured limit without a complete
    /// record being found.
    #[error(
        "CSV buffer overflow: {len} bytes buffered without a complete \
         record (limit is {limit})"
    )]
    Overflow {
        /// The number of bytes buffered.
        len: usize,
        /// The configured limit.
        limit: usize,
    },
    /// A record could not be written.
    #[error("CSV write error: {kind}")]
    Encode {
        /// Why the record could not be written.
        kind: EncodeErrorKind,
    },
    /// A record had a different number of fields than the header record.
    #[error(
        "CSV error: record {} (byte {}, line {}): found record with {len} \
         fields, but the header has {expected_len} fields",
        .pos.record(), .pos.byte(), .pos.line()
    )]
    UnequalLengths {
        /// The number of fields in the header.
        expected_len: u64,
        /// The number of fields in the bad record.
        len: u64,
        /// The position of the bad record.
        pos: Position,
    },
    /// The stream ended before any header record was seen.
    #[error("CSV error: stream ended without a header record")]
    MissingHeaders,
    /// An I/O error from the underlying source or sink.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Any other error reported by the underlying source or sink.
    #[error("stream error: {0}")]
    Stream(Box<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    /// Wrap an arbitrary source or sink error.
    pub fn stream<E>(err: E) -> Error
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Error::Stream(err.into())
    }

    /// The position of the record that caused this error, if one is known.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Decode { ref pos, .. } => Some(pos),
            Error::UnequalLengths { ref pos, .. } => Some(pos),
            _ => None,
        }
    }

    /// Returns true if this is an overflow error.
    pub fn is_overflow(&self) -> bool {
        match *self {
            Error::Overflow { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn decode(pos: &Position, err: ReadError) -> Error {
        let kind = match *err.kind() {
            ReadErrorKind::UnexpectedByte(byte) => {
                DecodeErrorKind::TrailingGarbage { byte, offset: err.offset() }
            }
            ReadErrorKind::UnterminatedQuote => {
                DecodeErrorKind::UnterminatedQuote
            }
            ReadErrorKind::OutputFull | ReadErrorKind::OutputEndsFull => {
                DecodeErrorKind::BufferFull { offset: err.offset() }
            }
        };
        Error::Decode { pos: pos.clone(), kind }
    }
}

/// The ways a candidate record can violate the CSV grammar.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeErrorKind {
    /// A closing quote was followed by something other than a delimiter or
    /// the end of the record.
    #[error(
        "unexpected byte {byte:#04x} after closing quote at offset {offset}"
    )]
    TrailingGarbage {
        /// The offending byte.
        byte: u8,
        /// Its offset from the start of the record.
        offset: usize,
    },
    /// A line held nothing but a record terminator.
    #[error("blank line")]
    BlankLine,
    /// The input ended inside a quoted field.
    #[error("quoted field not terminated at end of input")]
    UnterminatedQuote,
    /// The parsed record did not fit the buffers it was parsed into.
    #[error("record does not fit the parse buffers at offset {offset}")]
    BufferFull {
        /// How far into the record parsing got.
        offset: usize,
    },
}

/// The reasons a record cannot be written.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EncodeErrorKind {
    /// A float that is NaN or infinite has no CSV representation.
    #[error("field {field} is a non-finite float")]
    NonFiniteFloat {
        /// The index of the offending field.
        field: usize,
    },
    /// A field needed quotes, but the quote style forbids them.
    #[error("field {field} requires quotes but quoting is disabled")]
    QuoteRequired {
        /// The index of the offending field.
        field: usize,
    },
    /// A record had no fields.
    #[error("cannot write a record with no fields")]
    EmptyRecord,
}

impl From<WriteError> for EncodeErrorKind {
    fn from(err: WriteError) -> EncodeErrorKind {
        match err {
            WriteError::QuoteRequired { field } => {
                EncodeErrorKind::QuoteRequired { field }
            }
            WriteError::EmptyRecord => EncodeErrorKind::EmptyRecord,
        }
    }
}

impl From<EncodeErrorKind> for Error {
    fn from(kind: EncodeErrorKind) -> Error {
        Error::Encode { kind }
    }
}

/// A UTF-8 validation error that occurs when attempting to convert a
/// `ByteRecord` into a `StringRecord`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{err}")]
pub struct FromUtf8Error {
    record: ByteRecord,
    #[source]
    err: Utf8Error,
}

/// Create a new FromUtf8Error.
pub(crate) fn new_from_utf8_error(
    record: ByteRecord,
    err: Utf8Error,
) -> FromUtf8Error {
    FromUtf8Error { record, err }
}

impl FromUtf8Error {
    /// Access the underlying `ByteRecord` that failed UTF-8 validation.
    pub fn into_byte_record(self) -> ByteRecord {
        self.record
    }

    /// Access the underlying UTF-8 validation error.
    pub fn utf8_error(&self) -> &Utf8Error {
        &self.err
    }
}

/// A UTF-8 validation error.
///
/// The error includes the index of the field that failed validation, and the
/// last byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error(
    "invalid utf-8: invalid UTF-8 in field {field} near byte index \
     {valid_up_to}"
)]
pub struct Utf8Error {
    /// The field index of a byte record in which UTF-8 validation failed.
    field: usize,
    /// The index into the given field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

/// Create a new UTF-8 error.
pub(crate) fn new_utf8_error(field: usize, valid_up_to: usize) -> Utf8Error {
    Utf8Error { field, valid_up_to }
}

impl Utf8Error {
    /// The field index of a byte record in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the given field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}
