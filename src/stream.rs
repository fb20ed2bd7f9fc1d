/*!
The seam between the codecs and whatever moves bytes around.

A decoder pulls nothing on its own. Whoever owns the byte source pushes
chunks into it with `Decoder::handle_data` and tells it about the end of the
stream with `Decoder::handle_end`. The decoder, in turn, talks back to the
source only through the small [`Source`](trait.Source.html) trait, to pause,
resume or close it. The encoder side is the mirror image: it writes through a
[`Sink`](trait.Sink.html).

Records, errors and lifecycle events are delivered to a handler. Every
callback other than `DecodeHandler::record` has a default empty body, so a
handler only implements what it cares about.
*/

use std::io;

use crate::byte_record::{ByteRecord, Position};
use crate::error::Error;

/// A readable byte stream feeding a decoder.
pub trait Source {
    /// Whether this source may still produce data.
    fn is_readable(&self) -> bool;

    /// Ask the source to stop producing data for now.
    fn pause(&mut self);

    /// Ask the source to produce data again after a `pause`.
    fn resume(&mut self);

    /// Close the source. After this, `is_readable` must return false.
    fn close(&mut self);
}

/// A source with no state of its own.
///
/// This is handy when the caller feeds a decoder directly and has nothing to
/// pause or close.
impl Source for () {
    fn is_readable(&self) -> bool {
        true
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn close(&mut self) {}
}

/// A writable byte stream fed by an encoder.
pub trait Sink {
    /// Whether this sink still accepts data.
    fn is_writable(&self) -> bool;

    /// Write `data` to the sink.
    ///
    /// The returned flag is the sink's backpressure signal: `false` means
    /// the sink would like the writer to hold off until it drains.
    fn write(&mut self, data: &[u8]) -> io::Result<bool>;

    /// Signal that no more data will be written.
    fn end(&mut self) -> io::Result<()>;

    /// Close the sink. After this, `is_writable` must return false.
    fn close(&mut self);
}

impl Sink for Vec<u8> {
    fn is_writable(&self) -> bool {
        true
    }

    fn write(&mut self, data: &[u8]) -> io::Result<bool> {
        self.extend_from_slice(data);
        Ok(true)
    }

    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

/// What a record callback may do to the decoder that called it.
///
/// Closing through a `Control` takes effect as soon as the callback returns:
/// no further record, end or error is delivered, even if more complete
/// records are already buffered.
pub struct Control<'a> {
    source: &'a mut dyn Source,
    pos: &'a Position,
    close: bool,
}

impl<'a> Control<'a> {
    pub(crate) fn new(
        source: &'a mut dyn Source,
        pos: &'a Position,
    ) -> Control<'a> {
        Control { source, pos, close: false }
    }

    /// Pause the decoder's source.
    pub fn pause(&mut self) {
        self.source.pause();
    }

    /// Resume the decoder's source.
    pub fn resume(&mut self) {
        self.source.resume();
    }

    /// Close the decoder once this callback returns.
    pub fn close(&mut self) {
        self.close = true;
    }

    /// Whether `close` has been requested.
    pub fn is_closing(&self) -> bool {
        self.close
    }

    /// The position at which the current record starts.
    pub fn position(&self) -> &Position {
        self.pos
    }
}

/// Receives what a decoder produces.
pub trait DecodeHandler {
    /// Called once for every complete record, in input order.
    fn record(&mut self, record: ByteRecord, ctl: &mut Control<'_>);

    /// Called once when the input ended cleanly. The decoder closes right
    /// after.
    fn end(&mut self) {}

    /// Called at most once, with the error that stopped the decoder. The
    /// decoder closes right after.
    fn error(&mut self, _err: Error) {}

    /// Called exactly once when the decoder closes, for whatever reason.
    fn close(&mut self) {}
}

/// Collects every record.
impl DecodeHandler for Vec<ByteRecord> {
    fn record(&mut self, record: ByteRecord, _: &mut Control<'_>) {
        self.push(record);
    }
}

/// Receives lifecycle events from an encoder.
pub trait EncodeHandler {
    /// Called at most once, with the error that stopped the encoder. The
    /// encoder closes right after.
    fn error(&mut self, _err: Error) {}

    /// Called exactly once when the encoder closes.
    fn close(&mut self) {}

    /// Called when the sink has drained after refusing a write.
    fn drain(&mut self) {}
}

/// Ignores every event.
impl EncodeHandler for () {}
