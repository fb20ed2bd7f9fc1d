/*!
Decoding records as named columns.

The first record of the input is taken as the header. Every later record is
paired with it and handed to an [`AssocHandler`](trait.AssocHandler.html) as
an [`AssocRecord`](struct.AssocRecord.html), which looks fields up by name.

Every record must have exactly as many fields as the header. A record that
doesn't is reported as `Error::UnequalLengths`, and an input that ends before
any header is seen is reported as `Error::MissingHeaders`.

```
use csv_stream::{AssocHandler, AssocRecord, Control, DecoderBuilder};

#[derive(Default)]
struct Names(Vec<String>);

impl AssocHandler for Names {
    fn record(&mut self, record: AssocRecord, _: &mut Control<'_>) {
        let name = record.get("name").unwrap_or(&b""[..]);
        self.0.push(String::from_utf8_lossy(name).into_owned());
    }
}

let mut dec = DecoderBuilder::new().assoc((), Names::default());
dec.handle_data(b"id,name\n1,alice\n2,bob\n");
dec.handle_end();
assert_eq!(dec.handler().inner().0, vec!["alice", "bob"]);
```
*/

use std::sync::Arc;

use log::warn;

use crate::byte_record::{ByteRecord, ByteRecordIter};
use crate::decoder::Decoder;
use crate::error::Error;
use crate::stream::{Control, DecodeHandler};

/// A decoder whose records are paired with a header.
pub type AssocDecoder<S, H> = Decoder<S, HeaderMap<H>>;

/// Receives what a header-aware decoder produces.
pub trait AssocHandler {
    /// Called once with the header record, before any other record.
    fn headers(&mut self, _headers: &ByteRecord) {}

    /// Called once for every record after the header, in input order.
    fn record(&mut self, record: AssocRecord, ctl: &mut Control<'_>);

    /// Called once when the input ended cleanly after a header.
    fn end(&mut self) {}

    /// Called at most once, with the error that stopped the decoder.
    fn error(&mut self, _err: Error) {}

    /// Called exactly once when the decoder closes.
    fn close(&mut self) {}
}

/// Collects every record.
impl AssocHandler for Vec<AssocRecord> {
    fn record(&mut self, record: AssocRecord, _: &mut Control<'_>) {
        self.push(record);
    }
}

/// Pairs decoded records with the header record.
///
/// This is the `DecodeHandler` behind an
/// [`AssocDecoder`](type.AssocDecoder.html). It wraps the caller's
/// `AssocHandler`, which is available through `inner`.
#[derive(Debug)]
pub struct HeaderMap<H> {
    headers: Option<Arc<ByteRecord>>,
    handler: H,
}

impl<H: AssocHandler> HeaderMap<H> {
    /// Wrap `handler`.
    pub fn new(handler: H) -> HeaderMap<H> {
        HeaderMap { headers: None, handler }
    }

    /// The header record, once it has been seen.
    pub fn headers(&self) -> Option<&ByteRecord> {
        self.headers.as_ref().map(|h| &**h)
    }

    /// Returns a reference to the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }

    /// Returns a mutable reference to the wrapped handler.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Unwraps this, returning the wrapped handler.
    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H: AssocHandler> DecodeHandler for HeaderMap<H> {
    fn record(&mut self, record: ByteRecord, ctl: &mut Control<'_>) {
        let headers = match self.headers {
            Some(ref headers) => headers,
            None => {
                self.handler.headers(&record);
                self.headers = Some(Arc::new(record));
                return;
            }
        };
        if record.len() != headers.len() {
            let err = Error::UnequalLengths {
                expected_len: headers.len() as u64,
                len: record.len() as u64,
                pos: ctl.position().clone(),
            };
            warn!("{}", err);
            self.handler.error(err);
            ctl.close();
            return;
        }
        let record =
            AssocRecord { headers: Arc::clone(headers), values: record };
        self.handler.record(record, ctl);
    }

    fn end(&mut self) {
        if self.headers.is_none() {
            let err = Error::MissingHeaders;
            warn!("{}", err);
            self.handler.error(err);
        } else {
            self.handler.end();
        }
    }

    fn error(&mut self, err: Error) {
        self.handler.error(err);
    }

    fn close(&mut self) {
        self.handler.close();
    }
}

/// A record paired with the header record it was decoded under.
///
/// The header is shared between all records of one input, so these are
/// cheap to keep around.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssocRecord {
    headers: Arc<ByteRecord>,
    values: ByteRecord,
}

impl AssocRecord {
    /// Return the value of the column named `name`.
    ///
    /// When several columns share a name, the last one wins.
    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Option<&[u8]> {
        let name = name.as_ref();
        self.headers
            .iter()
            .enumerate()
            .filter(|&(_, h)| h == name)
            .last()
            .and_then(|(i, _)| self.values.get(i))
    }

    /// Return the value of the column at index `i`.
    pub fn get_index(&self, i: usize) -> Option<&[u8]> {
        self.values.get(i)
    }

    /// The header record.
    pub fn headers(&self) -> &ByteRecord {
        &self.headers
    }

    /// The values, in column order.
    pub fn values(&self) -> &ByteRecord {
        &self.values
    }

    /// Unwraps this, returning the values.
    pub fn into_values(self) -> ByteRecord {
        self.values
    }

    /// The number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over `(name, value)` pairs, in column order.
    pub fn iter(&self) -> AssocRecordIter<'_> {
        AssocRecordIter {
            names: self.headers.iter(),
            values: self.values.iter(),
        }
    }
}

impl<'a> IntoIterator for &'a AssocRecord {
    type IntoIter = AssocRecordIter<'a>;
    type Item = (&'a [u8], &'a [u8]);

    fn into_iter(self) -> AssocRecordIter<'a> {
        self.iter()
    }
}

/// An iterator over the `(name, value)` pairs of an `AssocRecord`.
pub struct AssocRecordIter<'r> {
    names: ByteRecordIter<'r>,
    values: ByteRecordIter<'r>,
}

impl<'r> Iterator for AssocRecordIter<'r> {
    type Item = (&'r [u8], &'r [u8]);

    fn next(&mut self) -> Option<(&'r [u8], &'r [u8])> {
        Some((self.names.next()?, self.values.next()?))
    }
}

impl<S, H> Decoder<S, HeaderMap<H>>
where
    S: crate::stream::Source,
    H: AssocHandler,
{
    /// The header record, once it has been seen.
    pub fn headers(&self) -> Option<&ByteRecord> {
        self.handler().headers()
    }
}
