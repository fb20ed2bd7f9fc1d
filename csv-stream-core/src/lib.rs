/*!
`csv-stream-core` is the record grammar used by the `csv-stream` crate.

It provides two pieces, one for each direction:

* [`Reader`](struct.Reader.html) splits a byte slice holding exactly one
  candidate record (including its `\n` or `\r\n` terminator) into fields. It
  keeps no state between calls. When the slice ends inside a quoted field, the
  reader says so instead of guessing, which is what lets a caller find record
  boundaries in data where quoted fields contain newlines.
* [`Writer`](struct.Writer.html) is the inverse: it decides whether a field
  needs quotes, escapes it, and emits delimiters and record terminators.

Neither piece does any I/O or buffering across records. The incremental,
chunk-at-a-time machinery lives in `csv-stream`.

# Example

```
use csv_stream_core::{ReadRecordResult, Reader};

let rdr = Reader::new();
let line = b"foo,\"bar,baz\"\r\n";
let mut output = vec![0; line.len()];
let mut ends = vec![0; line.len() + 1];

let (res, nout, nend) = rdr.read_record(line, &mut output, &mut ends).unwrap();
assert_eq!(res, ReadRecordResult::Record);
assert_eq!(&output[..nout], b"foobar,baz");
assert_eq!(&ends[..nend], &[3, 10]);
```
*/

#![deny(missing_docs)]

pub use crate::reader::{
    Progress, ReadError, ReadErrorKind, ReadRecordResult, Reader,
    ReaderBuilder,
};
pub use crate::writer::{
    QuoteStyle, Terminator, WriteError, Writer, WriterBuilder,
};

mod reader;
mod writer;
