#![allow(dead_code)]

use std::io;

use csv_stream::{
    AssocHandler, AssocRecord, ByteRecord, Control, DecodeHandler,
    EncodeHandler, Error, Sink, Source,
};

/// Everything a handler was told, in order.
#[derive(Debug)]
pub enum Event {
    Headers(Vec<String>),
    Record(Vec<String>),
    Assoc(Vec<(String, String)>),
    End,
    Error(Error),
    Close,
    Drain,
}

/// A handler that records every event it receives.
///
/// `close_after` closes the decoder from inside the record callback once that
/// many records have been seen, and `pause_after` pauses it.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub close_after: Option<usize>,
    pub pause_after: Option<usize>,
    seen: usize,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    pub fn closing_after(n: usize) -> Recorder {
        Recorder { close_after: Some(n), ..Recorder::default() }
    }

    pub fn pausing_after(n: usize) -> Recorder {
        Recorder { pause_after: Some(n), ..Recorder::default() }
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Record(ref r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn assocs(&self) -> Vec<Vec<(String, String)>> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Assoc(ref r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&Error> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Error(ref err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn ends(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, Event::End)).count()
    }

    pub fn closes(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, Event::Close)).count()
    }

    pub fn drains(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, Event::Drain)).count()
    }

    /// The events with records and errors reduced to a short name, for
    /// checking the order of lifecycle events.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .map(|e| match *e {
                Event::Headers(_) => "headers",
                Event::Record(_) | Event::Assoc(_) => "record",
                Event::End => "end",
                Event::Error(_) => "error",
                Event::Close => "close",
                Event::Drain => "drain",
            })
            .collect()
    }

    fn control(&mut self, ctl: &mut Control<'_>) {
        self.seen += 1;
        if Some(self.seen) == self.pause_after {
            ctl.pause();
        }
        if Some(self.seen) == self.close_after {
            ctl.close();
        }
    }
}

fn strings<'a, I: IntoIterator<Item = &'a [u8]>>(fields: I) -> Vec<String> {
    fields
        .into_iter()
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect()
}

impl DecodeHandler for Recorder {
    fn record(&mut self, record: ByteRecord, ctl: &mut Control<'_>) {
        self.events.push(Event::Record(strings(&record)));
        self.control(ctl);
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }

    fn error(&mut self, err: Error) {
        self.events.push(Event::Error(err));
    }

    fn close(&mut self) {
        self.events.push(Event::Close);
    }
}

impl AssocHandler for Recorder {
    fn headers(&mut self, headers: &ByteRecord) {
        self.events.push(Event::Headers(strings(headers)));
    }

    fn record(&mut self, record: AssocRecord, ctl: &mut Control<'_>) {
        let pairs = record
            .iter()
            .map(|(k, v)| {
                (
                    String::from_utf8_lossy(k).into_owned(),
                    String::from_utf8_lossy(v).into_owned(),
                )
            })
            .collect();
        self.events.push(Event::Assoc(pairs));
        self.control(ctl);
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }

    fn error(&mut self, err: Error) {
        self.events.push(Event::Error(err));
    }

    fn close(&mut self) {
        self.events.push(Event::Close);
    }
}

impl EncodeHandler for Recorder {
    fn error(&mut self, err: Error) {
        self.events.push(Event::Error(err));
    }

    fn close(&mut self) {
        self.events.push(Event::Close);
    }

    fn drain(&mut self) {
        self.events.push(Event::Drain);
    }
}

/// A source that only remembers what was asked of it.
#[derive(Debug)]
pub struct MockSource {
    pub readable: bool,
    pub paused: bool,
    pub pauses: usize,
    pub resumes: usize,
    pub closes: usize,
}

impl MockSource {
    pub fn new() -> MockSource {
        MockSource {
            readable: true,
            paused: false,
            pauses: 0,
            resumes: 0,
            closes: 0,
        }
    }

    pub fn unreadable() -> MockSource {
        MockSource { readable: false, ..MockSource::new() }
    }
}

impl Source for MockSource {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn pause(&mut self) {
        self.paused = true;
        self.pauses += 1;
    }

    fn resume(&mut self) {
        self.paused = false;
        self.resumes += 1;
    }

    fn close(&mut self) {
        self.readable = false;
        self.closes += 1;
    }
}

/// A sink that records every write and can be told to refuse or fail them.
#[derive(Debug)]
pub struct MockSink {
    pub writable: bool,
    pub accept: bool,
    pub fail: Option<io::ErrorKind>,
    pub writes: Vec<Vec<u8>>,
    pub ends: usize,
    pub closes: usize,
}

impl MockSink {
    pub fn new() -> MockSink {
        MockSink {
            writable: true,
            accept: true,
            fail: None,
            writes: vec![],
            ends: 0,
            closes: 0,
        }
    }

    pub fn unwritable() -> MockSink {
        MockSink { writable: false, ..MockSink::new() }
    }

    pub fn refusing() -> MockSink {
        MockSink { accept: false, ..MockSink::new() }
    }

    pub fn failing(kind: io::ErrorKind) -> MockSink {
        MockSink { fail: Some(kind), ..MockSink::new() }
    }

    /// All writes, concatenated.
    pub fn output(&self) -> String {
        String::from_utf8(self.writes.concat()).unwrap()
    }
}

impl Sink for MockSink {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn write(&mut self, data: &[u8]) -> io::Result<bool> {
        if let Some(kind) = self.fail {
            return Err(io::Error::new(kind, "mock sink failure"));
        }
        self.writes.push(data.to_vec());
        Ok(self.accept)
    }

    fn end(&mut self) -> io::Result<()> {
        self.ends += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.writable = false;
        self.closes += 1;
    }
}

/// Turn a slice of string slices into owned strings, for comparisons.
pub fn svec(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

/// Route `log` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
