/*!
Composing a decoder with an encoder.

[`Transcode`](struct.Transcode.html) is a `DecodeHandler` that writes every
record it receives to an encoder, optionally transforming it first. This is
enough to re-delimit a file, validate and normalize it, or drop columns,
without ever holding more than one record in memory.
*/

use log::debug;

use crate::byte_record::ByteRecord;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::stream::{Control, DecodeHandler, EncodeHandler, Sink};

/// Counts records and bytes passing through a pipeline.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Counter {
    records: u64,
    bytes: u64,
}

impl Counter {
    /// A counter starting at zero.
    pub fn new() -> Counter {
        Counter::default()
    }

    /// Count one record of `bytes` bytes.
    pub fn add(&mut self, bytes: usize) {
        self.records += 1;
        self.bytes += bytes as u64;
    }

    /// The number of records counted.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// The number of bytes counted.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// A decode handler that re-encodes every record.
///
/// Records are passed through `F` and written to the wrapped encoder. When
/// the encoder's sink refuses a write, the decoder's source is paused. When
/// the encoder closes on its own (because of an error), so does the decoder.
///
/// When decoding ends cleanly, the encoder is ended too. When decoding
/// fails, the error is kept (see `error`) and the encoder is closed without
/// being ended.
///
/// # Example
///
/// ```
/// use csv_stream::{DecoderBuilder, Encoder, Transcode};
///
/// let enc = Encoder::new(vec![], ());
/// let mut dec = DecoderBuilder::new()
///     .delimiter(b'\t')
///     .from_source((), Transcode::new(enc));
/// dec.handle_data(b"a\tb,c\n");
/// dec.handle_end();
///
/// let pipe = dec.into_handler();
/// assert_eq!(pipe.counter().records(), 1);
/// assert_eq!(pipe.encoder().sink(), b"a,\"b,c\"\n");
/// ```
pub struct Transcode<W, H, F = fn(ByteRecord) -> ByteRecord> {
    encoder: Encoder<W, H>,
    map: F,
    counter: Counter,
    error: Option<Error>,
}

impl<W: Sink, H: EncodeHandler> Transcode<W, H> {
    /// Write every record to `encoder` unchanged.
    pub fn new(encoder: Encoder<W, H>) -> Transcode<W, H> {
        Transcode {
            encoder,
            map: std::convert::identity,
            counter: Counter::new(),
            error: None,
        }
    }
}

impl<W, H, F> Transcode<W, H, F>
where
    W: Sink,
    H: EncodeHandler,
    F: FnMut(ByteRecord) -> ByteRecord,
{
    /// Write every record to `encoder` after passing it through `map`.
    pub fn with_map(encoder: Encoder<W, H>, map: F) -> Transcode<W, H, F> {
        Transcode { encoder, map, counter: Counter::new(), error: None }
    }

    /// What has been written so far.
    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// The decode error that stopped the pipeline, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns a reference to the encoder.
    pub fn encoder(&self) -> &Encoder<W, H> {
        &self.encoder
    }

    /// Returns a mutable reference to the encoder.
    ///
    /// This is how a caller reacts to a drained sink: forward it with
    /// `handle_drain`, then resume the decoder.
    pub fn encoder_mut(&mut self) -> &mut Encoder<W, H> {
        &mut self.encoder
    }

    /// Unwraps this, returning the encoder and any decode error.
    pub fn into_parts(self) -> (Encoder<W, H>, Option<Error>) {
        (self.encoder, self.error)
    }
}

impl<W, H, F> DecodeHandler for Transcode<W, H, F>
where
    W: Sink,
    H: EncodeHandler,
    F: FnMut(ByteRecord) -> ByteRecord,
{
    fn record(&mut self, record: ByteRecord, ctl: &mut Control<'_>) {
        let record = (self.map)(record);
        let accepted = self.encoder.write(&record);
        if self.encoder.is_closed() {
            debug!("encoder closed, closing decoder");
            ctl.close();
            return;
        }
        self.counter.add(self.encoder.last_record().len());
        if !accepted {
            debug!("sink refused record {}, pausing", ctl.position().record());
            ctl.pause();
        }
    }

    fn end(&mut self) {
        self.encoder.end();
    }

    fn error(&mut self, err: Error) {
        self.error = Some(err);
        self.encoder.close();
    }

    fn close(&mut self) {
        // A decoder closed early (by its source or its caller) leaves the
        // output truncated, so the sink is closed rather than ended.
        self.encoder.close();
    }
}
