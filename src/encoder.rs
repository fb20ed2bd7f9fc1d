use csv_stream_core::{
    QuoteStyle, Terminator, Writer as CoreWriter,
    WriterBuilder as CoreWriterBuilder,
};
use log::{debug, trace, warn};

use crate::error::{EncodeErrorKind, Error};
use crate::stream::{EncodeHandler, Sink};
use crate::value::{self, Value};

/// Builds a CSV encoder with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, record terminator
/// and more. Once an encoder is built, its configuration cannot be changed.
#[derive(Debug)]
pub struct EncoderBuilder {
    builder: CoreWriterBuilder,
}

impl Default for EncoderBuilder {
    fn default() -> EncoderBuilder {
        EncoderBuilder { builder: CoreWriterBuilder::default() }
    }
}

impl EncoderBuilder {
    /// Create a new builder for configuring CSV encoding.
    ///
    /// To convert a builder into an encoder, call `from_sink`.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_stream::EncoderBuilder;
    ///
    /// let mut enc = EncoderBuilder::new()
    ///     .delimiter(b'\t')
    ///     .from_sink(vec![], ());
    /// enc.write(&["a", "b c"]);
    /// assert_eq!(enc.sink(), b"a\tb c\n");
    /// ```
    pub fn new() -> EncoderBuilder {
        EncoderBuilder::default()
    }

    /// Build an encoder that writes to `sink` and reports to `handler`.
    pub fn from_sink<W: Sink, H: EncodeHandler>(
        &self,
        sink: W,
        handler: H,
    ) -> Encoder<W, H> {
        Encoder::with_config(self.builder.build(), sink, handler)
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut EncoderBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is `Terminator::Any(b'\n')`.
    pub fn terminator(&mut self, term: Terminator) -> &mut EncoderBuilder {
        self.builder.terminator(term);
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    /// With `QuoteStyle::Never`, a field that would need quotes is reported
    /// as an error.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut EncoderBuilder {
        self.builder.quote_style(style);
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut EncoderBuilder {
        self.builder.quote(quote);
        self
    }

    /// The escape character to use when writing CSV.
    ///
    /// Inside quoted fields, an escape character is doubled only when a quote
    /// follows it, so a decoder with the same configuration reads it back
    /// literally. `"C:\\dir, x"` keeps its single backslash.
    ///
    /// The default is `Some(b'\\')`.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut EncoderBuilder {
        self.builder.escape(escape);
        self
    }

    /// Whether to escape quotes by doubling them (the default), or with the
    /// escape character.
    pub fn double_quote(&mut self, yes: bool) -> &mut EncoderBuilder {
        self.builder.double_quote(yes);
        self
    }
}

/// A CSV encoder.
///
/// An encoder turns records (anything iterable whose items convert into a
/// [`Value`](enum.Value.html)) into CSV bytes, and writes each record to the
/// sink `W` with a single call. Events are reported to the handler `H`.
///
/// An encoder closes exactly once: after `end`, after the first error, or
/// when closed explicitly. Writes to a closed encoder are ignored.
///
/// # Example
///
/// ```
/// use csv_stream::{Encoder, Value};
///
/// let mut enc = Encoder::new(vec![], ());
/// enc.write(&["name", "age"]);
/// enc.write(vec![Value::Text("Smith, J"), Value::Int(42)]);
/// enc.end();
///
/// assert_eq!(enc.sink(), b"name,age\n\"Smith, J\",42\n");
/// ```
#[derive(Debug)]
pub struct Encoder<W, H> {
    core: CoreWriter,
    sink: W,
    handler: H,
    /// The bytes of the last record written.
    buf: Vec<u8>,
    nums: value::Buffers,
    closed: bool,
}

impl<W: Sink, H: EncodeHandler> Encoder<W, H> {
    /// Create an encoder with a default configuration.
    ///
    /// If `sink` is not writable, the encoder starts out closed and the
    /// handler is never called.
    pub fn new(sink: W, handler: H) -> Encoder<W, H> {
        EncoderBuilder::new().from_sink(sink, handler)
    }

    fn with_config(
        core: CoreWriter,
        mut sink: W,
        handler: H,
    ) -> Encoder<W, H> {
        let closed = !sink.is_writable();
        if closed {
            debug!("sink not writable, encoder starts closed");
            sink.close();
        }
        Encoder {
            core,
            sink,
            handler,
            buf: vec![],
            nums: value::Buffers::default(),
            closed,
        }
    }

    /// Write one record.
    ///
    /// The return value is whatever the sink said about accepting the data,
    /// so `false` means the caller should hold off until the sink drains. A
    /// closed encoder writes nothing and returns `false`.
    ///
    /// If a field cannot be encoded, nothing is written, the error is
    /// reported to the handler and the encoder closes.
    pub fn write<'a, I, T>(&mut self, record: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<Value<'a>>,
    {
        if self.closed {
            return false;
        }
        self.buf.clear();
        self.core.reset();
        for (i, field) in record.into_iter().enumerate() {
            let field = field.into();
            let bytes = match value::render(&field, &mut self.nums) {
                Some(bytes) => bytes,
                None => {
                    let kind = EncodeErrorKind::NonFiniteFloat { field: i };
                    self.fail(kind.into());
                    return false;
                }
            };
            if let Err(err) = self.core.write_field(bytes, &mut self.buf) {
                self.fail(EncodeErrorKind::from(err).into());
                return false;
            }
        }
        if let Err(err) = self.core.finish_record(&mut self.buf) {
            self.fail(EncodeErrorKind::from(err).into());
            return false;
        }
        trace!("writing {} byte record", self.buf.len());
        match self.sink.write(&self.buf) {
            Ok(accepted) => accepted,
            Err(err) => {
                self.fail(Error::Io(err));
                false
            }
        }
    }

    /// End the sink and close this encoder.
    pub fn end(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.sink.end() {
            self.fail(Error::Io(err));
            return;
        }
        debug!("encoder ended");
        self.close();
    }

    /// Write one last record, then end the sink and close this encoder.
    pub fn end_with<'a, I, T>(&mut self, record: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Value<'a>>,
    {
        self.write(record);
        self.end();
    }

    /// Tell the encoder that its sink has drained.
    pub fn handle_drain(&mut self) {
        if !self.closed {
            self.handler.drain();
        }
    }

    /// Report an error from the sink. The encoder closes.
    pub fn handle_error<E: Into<Error>>(&mut self, err: E) {
        if self.closed {
            return;
        }
        self.fail(err.into());
    }

    /// Tell the encoder that its sink has closed. The encoder closes.
    pub fn handle_close(&mut self) {
        self.close();
    }

    /// Close this encoder and its sink.
    ///
    /// Closing more than once has no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.buf = vec![];
        self.sink.close();
        debug!("encoder closed");
        self.handler.close();
    }

    /// Whether this encoder still accepts records.
    pub fn is_writable(&self) -> bool {
        !self.closed
    }

    /// Whether this encoder has closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The bytes of the most recent record handed to the sink.
    ///
    /// This is empty if no record has been written yet, or if the last
    /// write failed.
    pub fn last_record(&self) -> &[u8] {
        &self.buf
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Returns a mutable reference to the sink.
    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Returns a reference to the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns a mutable reference to the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Unwraps this encoder, returning its sink and handler.
    pub fn into_parts(self) -> (W, H) {
        (self.sink, self.handler)
    }

    fn fail(&mut self, err: Error) {
        warn!("{}", err);
        self.buf.clear();
        self.handler.error(err);
        self.close();
    }
}
