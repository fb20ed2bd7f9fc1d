use core::fmt;

use memchr::memchr;

/// A parser for a single CSV record.
///
/// A `Reader` is given a byte slice that is believed to hold exactly one
/// record, including its trailing `\n` (or `\r\n`) terminator, and splits it
/// into fields. It keeps no state from one call to the next, which means the
/// same `Reader` can be asked about the same bytes any number of times as
/// more of a record becomes available.
///
/// # Grammar
///
/// * Fields are separated by the delimiter (`,` by default).
/// * A field that begins with the quote byte (`"` by default) is quoted. In a
///   quoted field, a quote is written either doubled (`""`) or preceded by
///   the escape byte (`\` by default). Newlines are literal.
/// * Escape bytes only matter in a run that ends right before a quote. Such
///   a run of `n` escapes stands for `n / 2` escapes, and when `n` is odd the
///   quote is literal. Everywhere else escape bytes are plain data, so
///   `"C:\dir"` is the field `C:\dir`.
/// * In an unquoted field, every byte other than the delimiter is literal,
///   including quotes.
/// * A `\r` immediately before the final `\n` is dropped unless it is inside
///   a quoted field.
/// * After a closing quote, only a delimiter or the end of the record may
///   follow. Anything else is an error.
///
/// When the input ends inside a quoted field, this is *not* an error.
/// Instead, [`ReadRecordResult::InQuotedField`](enum.ReadRecordResult.html)
/// is returned, which tells the caller that the `\n` it thought terminated
/// the record is really part of a field.
#[derive(Clone, Debug)]
pub struct Reader {
    /// The delimiter that separates fields.
    delimiter: u8,
    /// The quotation byte.
    quote: u8,
    /// Whether to recognize escaped quotes.
    escape: Option<u8>,
    /// Whether to recognize doubled quotes.
    double_quote: bool,
}

impl Default for Reader {
    fn default() -> Reader {
        Reader {
            delimiter: b',',
            quote: b'"',
            escape: Some(b'\\'),
            double_quote: true,
        }
    }
}

/// Builds a CSV record parser with various configuration knobs.
///
/// Once a `Reader` is built, its configuration cannot be changed.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    rdr: Reader,
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser from this configuration.
    pub fn build(&self) -> Reader {
        self.rdr.clone()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.rdr.delimiter = delimiter;
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.rdr.quote = quote;
        self
    }

    /// The escape character to use when parsing CSV.
    ///
    /// Inside a quoted field, the escape character before a quote makes the
    /// quote literal. This is how some producers write quotes (`\"`) instead
    /// of doubling them. Before any other byte, the escape character is
    /// ordinary data.
    ///
    /// The default is `Some(b'\\')`. Use `None` to disable escapes entirely.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut ReaderBuilder {
        self.rdr.escape = escape;
        self
    }

    /// Enable double quote escapes.
    ///
    /// This is enabled by default, but it may be disabled. When disabled,
    /// doubled quotes are not interpreted as escapes, and a quote following
    /// a closing quote is an error.
    pub fn double_quote(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.rdr.double_quote = yes;
        self
    }
}

/// The result of parsing one candidate record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadRecordResult {
    /// The input held a complete record.
    Record,
    /// The input ended inside a quoted field.
    ///
    /// Nothing written to the output buffers is meaningful in this case.
    InQuotedField,
}

/// An error that occurs when a candidate record violates the CSV grammar.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadError {
    kind: ReadErrorKind,
    offset: usize,
}

/// The specific kind of grammar violation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadErrorKind {
    /// A byte other than a delimiter or the record terminator followed the
    /// closing quote of a quoted field.
    UnexpectedByte(u8),
    /// The record ended inside a quoted field.
    ///
    /// This is only returned by `Reader::parse_record`.
    UnterminatedQuote,
    /// The caller provided output buffer was too small to hold the field
    /// data of the record.
    OutputFull,
    /// The caller provided buffer of field end positions was too small.
    OutputEndsFull,
}

impl ReadError {
    /// The kind of grammar violation.
    pub fn kind(&self) -> &ReadErrorKind {
        &self.kind
    }

    /// The offset into the input at which the violation was found.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ReadErrorKind::UnexpectedByte(b) => write!(
                f,
                "unexpected byte {:#04x} after closing quote at offset {}",
                b, self.offset
            ),
            ReadErrorKind::UnterminatedQuote => write!(
                f,
                "quoted field not terminated before offset {}",
                self.offset
            ),
            ReadErrorKind::OutputFull => {
                write!(f, "output buffer full at offset {}", self.offset)
            }
            ReadErrorKind::OutputEndsFull => {
                write!(f, "field end buffer full at offset {}", self.offset)
            }
        }
    }
}

impl std::error::Error for ReadError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NfaState {
    StartField,
    InField,
    InQuotedField,
    InDoubleEscapedQuote,
}

/// How far a previous call got into a record that turned out to continue
/// past the end of its input.
///
/// Passing the same `Progress` to
/// [`Reader::read_record_from`](struct.Reader.html#method.read_record_from)
/// along with a longer prefix of the same record resumes parsing where the
/// last call stopped, instead of starting over. A fresh (default) value
/// starts at the beginning of a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Progress {
    state: NfaState,
    nin: usize,
    nout: usize,
    nend: usize,
}

impl Default for Progress {
    fn default() -> Progress {
        Progress { state: NfaState::StartField, nin: 0, nout: 0, nend: 0 }
    }
}

impl Progress {
    /// Start at the beginning of a record.
    pub fn new() -> Progress {
        Progress::default()
    }

    /// The number of input bytes already parsed.
    pub fn consumed(&self) -> usize {
        self.nin
    }
}

impl Reader {
    /// Create a new CSV parser with a default configuration.
    pub fn new() -> Reader {
        ReaderBuilder::new().build()
    }

    /// Parse the record in `input`, copying unescaped field data to `output`
    /// and the ending offset of each field (into `output`) to `ends`.
    ///
    /// A record never unescapes to more bytes than its input and never has
    /// more than `input.len() + 1` fields, so buffers of those sizes are
    /// always big enough.
    ///
    /// An input consisting of nothing but a terminator parses as one empty
    /// field.
    pub fn read_record(
        &self,
        input: &[u8],
        output: &mut [u8],
        ends: &mut [usize],
    ) -> Result<(ReadRecordResult, usize, usize), ReadError> {
        self.read_record_from(input, output, ends, &mut Progress::new())
    }

    /// Like `read_record`, but resumes from `progress`.
    ///
    /// `input` must start at the beginning of the record, and `output` and
    /// `ends` must still hold what the previous call wrote. When the result
    /// is `InQuotedField`, `progress` is updated so that a later call with
    /// more of the record only parses the new bytes. On any other result,
    /// `progress` is reset for the next record.
    pub fn read_record_from(
        &self,
        input: &[u8],
        output: &mut [u8],
        ends: &mut [usize],
        progress: &mut Progress,
    ) -> Result<(ReadRecordResult, usize, usize), ReadError> {
        use self::NfaState::*;

        let body = strip_terminator(input);
        let mut out = Output {
            output,
            ends,
            nout: progress.nout,
            nend: progress.nend,
        };
        let mut state = progress.state;
        let mut nin = progress.nin;
        *progress = Progress::new();
        while nin < body.len() {
            let c = body[nin];
            state = match state {
                StartField => {
                    if c == self.quote {
                        nin += 1;
                        InQuotedField
                    } else if c == self.delimiter {
                        nin += 1;
                        out.end_field(nin)?;
                        StartField
                    } else {
                        InField
                    }
                }
                InField => {
                    let rest = &body[nin..];
                    let len = memchr(self.delimiter, rest).unwrap_or(rest.len());
                    out.extend(&rest[..len], nin)?;
                    nin += len;
                    if nin < body.len() {
                        nin += 1;
                        out.end_field(nin)?;
                        StartField
                    } else {
                        InField
                    }
                }
                InQuotedField => {
                    if c == self.quote {
                        nin += 1;
                        InDoubleEscapedQuote
                    } else if self.escape == Some(c) {
                        let run = body[nin..].iter().take_while(|&&b| b == c);
                        let n = run.count();
                        match body.get(nin + n) {
                            // The run may continue, or be followed by a
                            // quote, in bytes not seen yet.
                            None => break,
                            Some(&b) if b == self.quote => {
                                out.repeat(c, n / 2, nin)?;
                                nin += n;
                                if n % 2 == 1 {
                                    nin += 1;
                                    out.push(self.quote, nin)?;
                                }
                            }
                            Some(_) => {
                                out.repeat(c, n, nin)?;
                                nin += n;
                            }
                        }
                        InQuotedField
                    } else {
                        nin += 1;
                        out.push(c, nin)?;
                        InQuotedField
                    }
                }
                InDoubleEscapedQuote => {
                    if self.double_quote && c == self.quote {
                        nin += 1;
                        out.push(c, nin)?;
                        InQuotedField
                    } else if c == self.delimiter {
                        nin += 1;
                        out.end_field(nin)?;
                        StartField
                    } else {
                        return Err(ReadError {
                            kind: ReadErrorKind::UnexpectedByte(c),
                            offset: nin,
                        });
                    }
                }
            };
        }
        match state {
            InQuotedField => {
                *progress =
                    Progress { state, nin, nout: out.nout, nend: out.nend };
                Ok((ReadRecordResult::InQuotedField, out.nout, out.nend))
            }
            StartField | InField | InDoubleEscapedQuote => {
                out.end_field(nin)?;
                Ok((ReadRecordResult::Record, out.nout, out.nend))
            }
        }
    }

    /// Like `read_record`, but treats input that ends inside a quoted field
    /// as an error.
    ///
    /// This is useful when the caller knows that `input` is the last record
    /// it will ever see.
    pub fn parse_record(
        &self,
        input: &[u8],
        output: &mut [u8],
        ends: &mut [usize],
    ) -> Result<(usize, usize), ReadError> {
        match self.read_record(input, output, ends)? {
            (ReadRecordResult::Record, nout, nend) => Ok((nout, nend)),
            (ReadRecordResult::InQuotedField, _, _) => Err(ReadError {
                kind: ReadErrorKind::UnterminatedQuote,
                offset: input.len(),
            }),
        }
    }
}

/// Caller provided output buffers along with how much of each is used.
struct Output<'o> {
    output: &'o mut [u8],
    ends: &'o mut [usize],
    nout: usize,
    nend: usize,
}

impl<'o> Output<'o> {
    #[inline(always)]
    fn push(&mut self, b: u8, offset: usize) -> Result<(), ReadError> {
        if self.nout >= self.output.len() {
            return Err(ReadError { kind: ReadErrorKind::OutputFull, offset });
        }
        self.output[self.nout] = b;
        self.nout += 1;
        Ok(())
    }

    #[inline(always)]
    fn extend(&mut self, bytes: &[u8], offset: usize) -> Result<(), ReadError> {
        let end = self.nout + bytes.len();
        if end > self.output.len() {
            return Err(ReadError { kind: ReadErrorKind::OutputFull, offset });
        }
        self.output[self.nout..end].copy_from_slice(bytes);
        self.nout = end;
        Ok(())
    }

    #[inline(always)]
    fn repeat(&mut self, b: u8, n: usize, offset: usize) -> Result<(), ReadError> {
        let end = self.nout + n;
        if end > self.output.len() {
            return Err(ReadError { kind: ReadErrorKind::OutputFull, offset });
        }
        for slot in &mut self.output[self.nout..end] {
            *slot = b;
        }
        self.nout = end;
        Ok(())
    }

    #[inline(always)]
    fn end_field(&mut self, offset: usize) -> Result<(), ReadError> {
        if self.nend >= self.ends.len() {
            return Err(ReadError {
                kind: ReadErrorKind::OutputEndsFull,
                offset,
            });
        }
        self.ends[self.nend] = self.nout;
        self.nend += 1;
        Ok(())
    }
}

/// Drop a trailing `\n` or `\r\n` from a candidate record.
fn strip_terminator(input: &[u8]) -> &[u8] {
    match input.split_last() {
        Some((&b'\n', rest)) => match rest.split_last() {
            Some((&b'\r', rest)) => rest,
            _ => rest,
        },
        _ => input,
    }
}
