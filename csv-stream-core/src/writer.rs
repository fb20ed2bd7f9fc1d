use core::fmt;

use memchr::{memchr, memchr2, memchr3};

/// A record terminator.
///
/// Use this to specify the record terminator while writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Writes `\r\n` after every record.
    CRLF,
    /// Writes the given byte after every record.
    Any(u8),
}

impl Terminator {
    /// Returns the bytes written after every record.
    fn bytes(&self) -> &[u8] {
        match *self {
            Terminator::CRLF => b"\r\n",
            Terminator::Any(ref b) => core::slice::from_ref(b),
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::Any(b'\n')
    }
}

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter, `\r`,
    /// `\n` or record terminator. Fields with leading or trailing spaces
    /// are written without quotes.
    ///
    /// This is the default.
    Necessary,
    /// This *never* writes quotes.
    ///
    /// If a field requires quotes, then the writer will report an error.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// A builder for configuring a CSV writer.
///
/// This builder permits specifying the CSV delimiter, terminator, quoting
/// style and more.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    wtr: Writer,
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration.
    pub fn build(&self) -> Writer {
        let mut wtr = self.wtr.clone();
        wtr.reset();
        wtr
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.wtr.delimiter = delimiter;
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// A record terminator can be any single byte, or the special value
    /// `Terminator::CRLF`, which uses `\r\n`.
    ///
    /// The default is `Terminator::Any(b'\n')`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.wtr.term = term;
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.wtr.style = style;
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default value is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.wtr.quote = quote;
        self
    }

    /// The escape character to use when writing CSV.
    ///
    /// Inside a quoted field, a run of escape characters is doubled when a
    /// quote (or the closing quote) follows it, so that a reader configured
    /// with the same escape reads it back literally. Other escape characters
    /// are written as is. When `double_quote` is disabled, the escape is also
    /// what precedes a quote.
    ///
    /// The default value is `Some(b'\\')`.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut WriterBuilder {
        self.wtr.escape = escape;
        self
    }

    /// The quoting escape mechanism to use when writing CSV.
    ///
    /// When enabled (which is the default), quotes are escaped by doubling
    /// them. e.g., `"` escapes to `""`.
    ///
    /// When disabled, quotes are escaped with the escape character (which
    /// is `\\` by default). If there is no escape character, quotes are
    /// doubled anyway.
    pub fn double_quote(&mut self, yes: bool) -> &mut WriterBuilder {
        self.wtr.double_quote = yes;
        self
    }
}

/// An error that occurs when a record cannot be written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteError {
    /// The field at the given index needs quotes, but the quote style is
    /// `QuoteStyle::Never`.
    QuoteRequired {
        /// The index of the offending field in its record.
        field: usize,
    },
    /// A record with no fields cannot be represented.
    EmptyRecord,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WriteError::QuoteRequired { field } => write!(
                f,
                "field {} requires quotes but quoting is disabled",
                field
            ),
            WriteError::EmptyRecord => {
                write!(f, "cannot write a record with no fields")
            }
        }
    }
}

impl std::error::Error for WriteError {}

/// A writer for CSV data.
///
/// Fields are appended one at a time with `write_field`, and a record is
/// completed with `finish_record`. All output goes to a caller provided
/// `Vec<u8>`.
///
/// # RFC 4180
///
/// This writer conforms to RFC 4180 with one exception: it doesn't guarantee
/// that all records written are of the same length. Instead, the onus is on
/// the caller to ensure that all records written are of the same length.
#[derive(Clone, Debug)]
pub struct Writer {
    /// The number of fields written in the current record.
    fields: usize,
    /// Whether the last field written was empty and unquoted.
    last_unquoted_empty: bool,
    delimiter: u8,
    term: Terminator,
    style: QuoteStyle,
    quote: u8,
    escape: Option<u8>,
    double_quote: bool,
}

impl Default for Writer {
    fn default() -> Writer {
        Writer {
            fields: 0,
            last_unquoted_empty: false,
            delimiter: b',',
            term: Terminator::default(),
            style: QuoteStyle::default(),
            quote: b'"',
            escape: Some(b'\\'),
            double_quote: true,
        }
    }
}

impl Writer {
    /// Creates a new CSV writer with the default configuration.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// Forget any partially written record.
    ///
    /// The next call to `write_field` starts a new record.
    pub fn reset(&mut self) {
        self.fields = 0;
        self.last_unquoted_empty = false;
    }

    /// Returns true if and only if `field` must be quoted to be read back
    /// as the same bytes.
    pub fn should_quote(&self, field: &[u8]) -> bool {
        let term = match self.term {
            Terminator::CRLF => b'\r',
            Terminator::Any(b) => b,
        };
        memchr3(self.delimiter, self.quote, b'\n', field).is_some()
            || memchr2(b'\r', term, field).is_some()
    }

    /// Append `field` to `out`, preceded by a delimiter if it isn't the
    /// first field of the current record.
    pub fn write_field(
        &mut self,
        field: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let quoted = match self.style {
            QuoteStyle::Always => true,
            QuoteStyle::Necessary => self.should_quote(field),
            QuoteStyle::Never => {
                if self.should_quote(field) {
                    return Err(WriteError::QuoteRequired { field: self.fields });
                }
                false
            }
        };
        if self.fields > 0 {
            out.push(self.delimiter);
        }
        if quoted {
            self.quote_field(field, out);
        } else {
            out.extend_from_slice(field);
        }
        self.fields += 1;
        self.last_unquoted_empty = !quoted && field.is_empty();
        Ok(())
    }

    /// Complete the current record by writing the record terminator.
    ///
    /// A record consisting of a single empty field is written as an empty
    /// quoted field, since a bare terminator would be read back as a blank
    /// line. A record with no fields at all is an error.
    pub fn finish_record(&mut self, out: &mut Vec<u8>) -> Result<(), WriteError> {
        if self.fields == 0 {
            return Err(WriteError::EmptyRecord);
        }
        if self.fields == 1 && self.last_unquoted_empty {
            if self.style == QuoteStyle::Never {
                return Err(WriteError::QuoteRequired { field: 0 });
            }
            out.push(self.quote);
            out.push(self.quote);
        }
        out.extend_from_slice(self.term.bytes());
        self.reset();
        Ok(())
    }

    fn quote_field(&self, mut field: &[u8], out: &mut Vec<u8>) {
        out.push(self.quote);
        loop {
            let next = match self.escape {
                Some(esc) => memchr2(self.quote, esc, field),
                None => memchr(self.quote, field),
            };
            let i = match next {
                None => {
                    out.extend_from_slice(field);
                    break;
                }
                Some(i) => i,
            };
            out.extend_from_slice(&field[..i]);
            field = &field[i..];
            let b = field[0];
            if b == self.quote {
                match self.escape {
                    Some(esc) if !self.double_quote => out.push(esc),
                    _ => out.push(self.quote),
                }
                out.push(b);
                field = &field[1..];
                continue;
            }
            // A run of escape bytes is doubled only when a quote follows it,
            // including the closing quote.
            let n = field.iter().take_while(|&&x| x == b).count();
            let before_quote = field.get(n).map_or(true, |&x| x == self.quote);
            let len = out.len() + if before_quote { 2 * n } else { n };
            out.resize(len, b);
            field = &field[n..];
        }
        out.push(self.quote);
    }
}
