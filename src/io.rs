/*!
Adapters between the codecs and `std::io`.

[`ReadSource`](struct.ReadSource.html) wraps any `io::Read` so a decoder can
pull from it with `Decoder::drive`. [`WriteSink`](struct.WriteSink.html)
wraps any `io::Write` so an encoder can write to it.
*/

use std::cmp;
use std::io::{self, Read, Write};

use log::{debug, trace};

use crate::decoder::Decoder;
use crate::stream::{DecodeHandler, Sink, Source};

/// The default number of bytes read per chunk.
const DEFAULT_CHUNK_SIZE: usize = 8 * (1 << 10);

/// A [`Source`](../trait.Source.html) reading from an `io::Read`.
#[derive(Debug)]
pub struct ReadSource<R> {
    rdr: R,
    chunk_size: usize,
    paused: bool,
    closed: bool,
}

impl<R: Read> ReadSource<R> {
    /// Wrap `rdr`, reading 8 KiB at a time.
    pub fn new(rdr: R) -> ReadSource<R> {
        ReadSource::with_chunk_size(rdr, DEFAULT_CHUNK_SIZE)
    }

    /// Wrap `rdr`, reading at most `chunk_size` bytes at a time.
    ///
    /// A chunk size of `0` is treated as `1`.
    pub fn with_chunk_size(rdr: R, chunk_size: usize) -> ReadSource<R> {
        ReadSource {
            rdr,
            chunk_size: cmp::max(1, chunk_size),
            paused: false,
            closed: false,
        }
    }

    /// Whether the source has been paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Unwraps this source, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn is_readable(&self) -> bool {
        !self.closed
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl<R: Read, H: DecodeHandler> Decoder<ReadSource<R>, H> {
    /// Pump chunks from the reader into this decoder.
    ///
    /// This returns when the decoder closes (because the input ended, an
    /// error occurred or a handler closed it) or when the source is paused.
    /// After a pause, call `resume` and `drive` again to continue.
    ///
    /// Read errors other than `io::ErrorKind::Interrupted` are reported to
    /// the handler like any other error.
    pub fn drive(&mut self) {
        let mut chunk = vec![0; self.source().chunk_size];
        while !self.is_closed() && !self.source().is_paused() {
            match self.source_mut().rdr.read(&mut chunk) {
                Ok(0) => {
                    debug!("reader reached EOF");
                    self.handle_end();
                }
                Ok(n) => {
                    trace!("read {} byte chunk", n);
                    self.handle_data(&chunk[..n]);
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => self.handle_error(err),
            }
        }
    }
}

/// A [`Sink`](../trait.Sink.html) writing to an `io::Write`.
///
/// Every write is accepted in full, so this sink never asks for
/// backpressure.
#[derive(Debug)]
pub struct WriteSink<W> {
    wtr: W,
    closed: bool,
}

impl<W: Write> WriteSink<W> {
    /// Wrap `wtr`.
    pub fn new(wtr: W) -> WriteSink<W> {
        WriteSink { wtr, closed: false }
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.wtr
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.wtr
    }

    /// Unwraps this sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn is_writable(&self) -> bool {
        !self.closed
    }

    fn write(&mut self, data: &[u8]) -> io::Result<bool> {
        self.wtr.write_all(data)?;
        Ok(true)
    }

    fn end(&mut self) -> io::Result<()> {
        self.wtr.flush()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
