/*!
The `csv-stream` crate decodes and encodes CSV incrementally, over byte
streams that arrive (or leave) in arbitrary chunks.

A [`Decoder`](struct.Decoder.html) is fed chunks as they come in and hands
each complete record to a [`DecodeHandler`](trait.DecodeHandler.html).
Chunks may split a record, a quoted field or an escape sequence anywhere,
and quoted fields may contain newlines. The amount of data buffered while
looking for the end of a record is bounded.

An [`Encoder`](struct.Encoder.html) is the other direction: it turns records
of [`Value`](enum.Value.html)s into CSV, quoting fields only where needed,
and writes each record to a [`Sink`](trait.Sink.html) in one call.

On top of those:

* [`assoc`](assoc/index.html) treats the first record as a header and hands
  out records as named columns.
* [`io`](io/index.html) connects the codecs to `std::io` readers and
  writers.
* [`pipe`](pipe/index.html) connects a decoder to an encoder, for
  converting one CSV dialect to another.

The record grammar itself lives in the `csv-stream-core` crate.

# Example

```
use csv_stream::{ByteRecord, Decoder, Encoder};

let mut dec = Decoder::new((), Vec::<ByteRecord>::new());
for chunk in &[&b"name,quote\nAda,\"Hello,"[..], &b" world\"\n"[..]] {
    dec.handle_data(chunk);
}
dec.handle_end();
let records = dec.into_handler();
assert_eq!(records[1], vec!["Ada", "Hello, world"]);

let mut enc = Encoder::new(vec![], ());
for record in &records {
    enc.write(record);
}
enc.end();
assert_eq!(enc.sink(), b"name,quote\nAda,\"Hello, world\"\n");
```
*/

#![deny(missing_docs)]

pub use csv_stream_core::{QuoteStyle, Terminator};

pub use crate::assoc::{
    AssocDecoder, AssocHandler, AssocRecord, AssocRecordIter, HeaderMap,
};
pub use crate::byte_record::{ByteRecord, ByteRecordIter, Position};
pub use crate::decoder::{Decoder, DecoderBuilder, DEFAULT_MAX_BUFFER_LEN};
pub use crate::encoder::{Encoder, EncoderBuilder};
pub use crate::error::{
    DecodeErrorKind, EncodeErrorKind, Error, FromUtf8Error, Result, Utf8Error,
};
pub use crate::pipe::{Counter, Transcode};
pub use crate::stream::{Control, DecodeHandler, EncodeHandler, Sink, Source};
pub use crate::string_record::{StringRecord, StringRecordIter};
pub use crate::value::Value;

pub mod assoc;
mod byte_record;
mod decoder;
mod encoder;
mod error;
pub mod io;
pub mod pipe;
#[cfg(feature = "serde")]
mod serde_impl;
pub mod stream;
mod string_record;
mod value;
