use csv_stream_core::{
    Progress, ReadRecordResult, Reader as CoreReader,
    ReaderBuilder as CoreReaderBuilder,
};
use log::{debug, trace, warn};
use memchr::memchr;

use crate::assoc::{AssocDecoder, AssocHandler, HeaderMap};
use crate::byte_record::{self, ByteRecord, Position};
use crate::error::{DecodeErrorKind, Error};
use crate::stream::{Control, DecodeHandler, Source};

/// The default limit on the number of bytes a decoder buffers while looking
/// for the end of a record.
pub const DEFAULT_MAX_BUFFER_LEN: usize = 65536;

/// Builds a CSV decoder with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, quote and escape
/// characters, and how much a decoder may buffer. Once a decoder is built,
/// its configuration cannot be changed.
#[derive(Debug)]
pub struct DecoderBuilder {
    builder: Box<CoreReaderBuilder>,
    max_buffer_len: usize,
}

impl Default for DecoderBuilder {
    fn default() -> DecoderBuilder {
        DecoderBuilder {
            builder: Box::new(CoreReaderBuilder::default()),
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
        }
    }
}

impl DecoderBuilder {
    /// Create a new builder for configuring CSV decoding.
    ///
    /// To convert a builder into a decoder, call one of the methods starting
    /// with `from_` or `assoc`.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_stream::{ByteRecord, DecoderBuilder};
    ///
    /// let mut dec = DecoderBuilder::new()
    ///     .delimiter(b';')
    ///     .from_source((), Vec::<ByteRecord>::new());
    /// dec.handle_data(b"city;pop\nBoston;4628910\n");
    /// assert_eq!(dec.handler()[1], vec!["Boston", "4628910"]);
    /// ```
    pub fn new() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// Build a decoder that reports records from `source` to `handler`.
    pub fn from_source<S: Source, H: DecodeHandler>(
        &self,
        source: S,
        handler: H,
    ) -> Decoder<S, H> {
        Decoder::with_config(
            self.builder.build(),
            self.max_buffer_len,
            source,
            handler,
        )
    }

    /// Build a decoder that treats the first record as a header, and reports
    /// every later record as a mapping from header names to values.
    pub fn assoc<S: Source, H: AssocHandler>(
        &self,
        source: S,
        handler: H,
    ) -> AssocDecoder<S, H> {
        self.from_source(source, HeaderMap::new(handler))
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut DecoderBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut DecoderBuilder {
        self.builder.quote(quote);
        self
    }

    /// The escape character to use when parsing CSV.
    ///
    /// Inside a quoted field, a run of escape characters followed by a quote
    /// stands for half as many escape characters, and when the run is odd
    /// the quote is literal. Escape characters before any other byte are
    /// ordinary data. The default is `Some(b'\\')`.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut DecoderBuilder {
        self.builder.escape(escape);
        self
    }

    /// Enable double quote escapes.
    ///
    /// This is enabled by default.
    pub fn double_quote(&mut self, yes: bool) -> &mut DecoderBuilder {
        self.builder.double_quote(yes);
        self
    }

    /// The most bytes a decoder buffers while looking for the end of a
    /// record.
    ///
    /// A record terminator found at an offset past this limit is not
    /// considered, and a buffer that grows past it is reported as
    /// `Error::Overflow`.
    ///
    /// The default is `65536`.
    pub fn max_buffer_len(&mut self, len: usize) -> &mut DecoderBuilder {
        self.max_buffer_len = len;
        self
    }
}

/// An incremental CSV decoder.
///
/// A decoder is fed arbitrary chunks of bytes with `handle_data`. Chunks may
/// split a record, a quoted field or an escape sequence anywhere. Every time
/// a complete record has been buffered, it is handed to the handler `H`.
///
/// Records end at `\n` (optionally preceded by `\r`), except when the `\n`
/// is inside a quoted field. A decoder never searches the same bytes for a
/// terminator twice, and never buffers more than the configured limit.
/// The record grammar picks up where it left off when a newline turns out to
/// be inside a quoted field, so a long quoted field is parsed once.
///
/// A doubled quote does not close a field. `"a""` followed by `\n` is a
/// field that is still open, holding `a"` and a newline, so the decoder
/// waits for more input instead of emitting a record.
///
/// Whatever happens, a decoder closes exactly once: after the end of the
/// input, after the first error, or when closed explicitly (by the caller,
/// by its source or from inside a handler callback). A closed decoder
/// ignores everything fed to it.
///
/// # Example
///
/// ```
/// use csv_stream::{ByteRecord, Decoder};
///
/// let mut dec = Decoder::new((), Vec::<ByteRecord>::new());
/// dec.handle_data(b"name,note\nalice,\"line 1");
/// dec.handle_data(b"\nline 2\"\n");
/// dec.handle_end();
///
/// let records = dec.into_handler();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1], vec!["alice", "line 1\nline 2"]);
/// ```
#[derive(Debug)]
pub struct Decoder<S, H> {
    /// The record grammar.
    core: CoreReader,
    source: S,
    handler: H,
    /// Bytes received but not yet resolved into a record.
    buf: Vec<u8>,
    /// Everything before this offset into `buf` is known not to hold a
    /// record terminator.
    scan: usize,
    max_buffer_len: usize,
    /// Scratch space for unescaped field data of the record being parsed.
    out: Vec<u8>,
    /// Scratch space for the field ends of the record being parsed.
    ends: Vec<usize>,
    /// How far the record grammar got into `buf`.
    progress: Progress,
    /// The position of the start of `buf` in the input.
    pos: Position,
    closed: bool,
}

impl<S: Source, H: DecodeHandler> Decoder<S, H> {
    /// Create a decoder with a default configuration.
    ///
    /// If `source` is not readable, the decoder starts out closed and the
    /// handler is never called.
    pub fn new(source: S, handler: H) -> Decoder<S, H> {
        DecoderBuilder::new().from_source(source, handler)
    }

    fn with_config(
        core: CoreReader,
        max_buffer_len: usize,
        mut source: S,
        handler: H,
    ) -> Decoder<S, H> {
        let closed = !source.is_readable();
        if closed {
            debug!("source not readable, decoder starts closed");
            source.close();
        }
        Decoder {
            core,
            source,
            handler,
            buf: vec![],
            scan: 0,
            max_buffer_len,
            out: vec![],
            ends: vec![],
            progress: Progress::new(),
            pos: Position::new(),
            closed,
        }
    }

    /// Feed the next chunk of input.
    pub fn handle_data(&mut self, chunk: &[u8]) {
        if self.closed {
            return;
        }
        self.buf.extend_from_slice(chunk);

        while let Some(i) = memchr(b'\n', &self.buf[self.scan..]) {
            let nl = self.scan + i;
            if nl > self.max_buffer_len {
                break;
            }
            let line = &self.buf[..=nl];
            if self.out.len() < line.len() {
                self.out.resize(line.len(), 0);
            }
            if self.ends.len() < line.len() + 1 {
                self.ends.resize(line.len() + 1, 0);
            }
            let res = self.core.read_record_from(
                line,
                &mut self.out,
                &mut self.ends,
                &mut self.progress,
            );
            let (nout, nend) = match res {
                Ok((ReadRecordResult::InQuotedField, _, _)) => {
                    trace!("newline at {} is inside a quoted field", nl);
                    self.scan = nl + 1;
                    continue;
                }
                Ok((ReadRecordResult::Record, nout, nend)) => (nout, nend),
                Err(err) => {
                    let err = Error::decode(&self.pos, err);
                    self.fail(err);
                    return;
                }
            };
            if line == b"\n" || line == b"\r\n" {
                let kind = DecodeErrorKind::BlankLine;
                self.fail(Error::Decode { pos: self.pos.clone(), kind });
                return;
            }
            let record =
                byte_record::from_parts(&self.out[..nout], &self.ends[..nend]);

            let start = self.pos.clone();
            self.pos.advance(&self.buf[..=nl]);
            self.buf.drain(..=nl);
            self.scan = 0;
            trace!("record {} with {} fields", start.record(), nend);
            if !self.emit(record, &start) {
                return;
            }
        }

        if self.buf.len() > self.max_buffer_len {
            let (len, limit) = (self.buf.len(), self.max_buffer_len);
            debug!("{} bytes buffered past limit of {}", len, limit);
            self.fail(Error::Overflow { len, limit });
        }
    }

    /// Tell the decoder that the input has ended.
    ///
    /// Whatever is left in the buffer is treated as a final record without a
    /// trailing newline. If it still doesn't make a complete record (because
    /// a quoted field was never closed), that is reported as an error and
    /// the end is not.
    pub fn handle_end(&mut self) {
        if self.closed {
            return;
        }
        if !self.buf.is_empty() {
            self.handle_data(b"\n");
        }
        if self.closed {
            return;
        }
        if !self.buf.is_empty() {
            let kind = DecodeErrorKind::UnterminatedQuote;
            self.fail(Error::Decode { pos: self.pos.clone(), kind });
            return;
        }
        debug!("input ended after {} records", self.pos.record());
        self.handler.end();
        self.close();
    }

    /// Report an error from the source. The decoder closes.
    pub fn handle_error<E: Into<Error>>(&mut self, err: E) {
        if self.closed {
            return;
        }
        self.fail(err.into());
    }

    /// Tell the decoder that its source has closed. The decoder closes.
    pub fn handle_close(&mut self) {
        self.close();
    }

    /// Close this decoder.
    ///
    /// Any buffered bytes are discarded, the source is closed and the
    /// handler's `close` is called. Closing more than once has no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.buf = vec![];
        self.scan = 0;
        self.out = vec![];
        self.ends = vec![];
        self.progress = Progress::new();
        self.source.close();
        debug!("decoder closed at record {}", self.pos.record());
        self.handler.close();
    }

    /// Pause the source.
    pub fn pause(&mut self) {
        self.source.pause();
    }

    /// Resume the source.
    pub fn resume(&mut self) {
        self.source.resume();
    }

    /// Whether this decoder still accepts input.
    pub fn is_readable(&self) -> bool {
        !self.closed
    }

    /// Whether this decoder has closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The position of the start of the next record.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// The number of bytes buffered but not yet resolved into a record.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns a reference to the source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a mutable reference to the source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns a reference to the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns a mutable reference to the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Unwraps this decoder, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Unwraps this decoder, returning its source and handler.
    pub fn into_parts(self) -> (S, H) {
        (self.source, self.handler)
    }

    /// Hand `record` to the handler. Returns false if the handler closed
    /// the decoder.
    fn emit(&mut self, record: ByteRecord, start: &Position) -> bool {
        let mut ctl = Control::new(&mut self.source, start);
        self.handler.record(record, &mut ctl);
        if ctl.is_closing() {
            debug!("closed from record callback");
            self.close();
        }
        !self.closed
    }

    fn fail(&mut self, err: Error) {
        warn!("{}", err);
        self.handler.error(err);
        self.close();
    }
}
