use csv_stream::{
    ByteRecord, DecodeErrorKind, Decoder, DecoderBuilder, Error,
};

use crate::common::{svec, MockSource, Recorder};

mod common;

fn decoder() -> Decoder<MockSource, Recorder> {
    Decoder::new(MockSource::new(), Recorder::new())
}

fn decode_all(chunks: &[&str]) -> Recorder {
    let mut dec = decoder();
    for chunk in chunks {
        dec.handle_data(chunk.as_bytes());
    }
    dec.handle_end();
    dec.into_handler()
}

#[test]
fn simple_record() {
    let mut dec = decoder();
    dec.handle_data(b"hello,world\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello", "world"])]);
    assert_eq!(dec.handler().kinds(), vec!["record"]);
}

#[test]
fn crlf_terminator() {
    let mut dec = decoder();
    dec.handle_data(b"hello,world\r\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello", "world"])]);
}

#[test]
fn custom_delimiter() {
    let mut dec = DecoderBuilder::new()
        .delimiter(b';')
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"hello;world\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello", "world"])]);
}

#[test]
fn numbers_stay_text() {
    let mut dec = decoder();
    dec.handle_data(b"1,2,3\n");
    assert_eq!(dec.handler().records(), vec![svec(&["1", "2", "3"])]);
}

#[test]
fn empty_fields() {
    let mut dec = decoder();
    dec.handle_data(b",,\n");
    assert_eq!(dec.handler().records(), vec![svec(&["", "", ""])]);
}

#[test]
fn quoted_field() {
    let mut dec = decoder();
    dec.handle_data(b"\"hello world\",test\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["hello world", "test"])]
    );
}

#[test]
fn doubled_and_escaped_quotes() {
    let mut dec = decoder();
    dec.handle_data(b"\"say \"\"hi\"\"\",\"a\\\"b\"\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["say \"hi\"", "a\"b"])]
    );
}

#[test]
fn backslash_before_ordinary_byte() {
    let mut dec = decoder();
    dec.handle_data(b"\"C:\\dir, x\",\"\\\\host\\share\"\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["C:\\dir, x", "\\\\host\\share"])]
    );
}

#[test]
fn backslash_run_split_across_chunks() {
    let mut dec = decoder();
    dec.handle_data(b"\"a\n\\");
    dec.handle_data(b"\\");
    dec.handle_data(b"\\\"\"\n");
    assert_eq!(dec.handler().records(), vec![svec(&["a\n\\\""])]);
}

#[test]
fn doubled_quote_before_newline_keeps_field_open() {
    let mut dec = decoder();
    dec.handle_data(b"\"a\"\"\n");
    assert!(dec.handler().kinds().is_empty());
    assert_eq!(dec.buffered_len(), 5);
    dec.handle_data(b"b\"\n");
    assert_eq!(dec.handler().records(), vec![svec(&["a\"\nb"])]);
}

#[test]
fn many_newlines_in_quoted_field() {
    let n = 10_000;
    let mut dec = DecoderBuilder::new()
        .max_buffer_len(n + 4)
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"\"");
    for _ in 0..n {
        dec.handle_data(b"\n");
    }
    assert!(dec.handler().kinds().is_empty());
    dec.handle_data(b"\"\n");
    let field = "\n".repeat(n);
    assert_eq!(dec.handler().records(), vec![svec(&[field.as_str()])]);
    assert_eq!(dec.buffered_len(), 0);
}

#[test]
fn newline_in_quoted_field() {
    let mut dec = decoder();
    dec.handle_data(b"hello,\"hello\nworld\"\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["hello", "hello\nworld"])]
    );
}

#[test]
fn several_newlines_in_quoted_field() {
    let mut dec = decoder();
    dec.handle_data(b"\"a\n\nb\n\",c\n");
    assert_eq!(dec.handler().records(), vec![svec(&["a\n\nb\n", "c"])]);
}

#[test]
fn quoted_field_ending_with_newline() {
    let mut dec = decoder();
    dec.handle_data(b"\"hello\n\"\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello\n"])]);
}

#[test]
fn quoted_field_only_newline() {
    let mut dec = decoder();
    dec.handle_data(b"\"\n\"\n");
    assert_eq!(dec.handler().records(), vec![svec(&["\n"])]);
}

#[test]
fn no_newline_no_record() {
    let mut dec = decoder();
    dec.handle_data(b"hello");
    assert!(dec.handler().events.is_empty());
    assert_eq!(dec.buffered_len(), 5);
}

#[test]
fn record_across_chunks() {
    let mut dec = decoder();
    dec.handle_data(b"hello,");
    dec.handle_data(b"w");
    dec.handle_data(b"orld\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello", "world"])]);
}

#[test]
fn quoted_newline_across_chunks() {
    let mut dec = decoder();
    dec.handle_data(b"a,\"b\n");
    assert!(dec.handler().records().is_empty());
    dec.handle_data(b"c\"\nd\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["a", "b\nc"]), svec(&["d"])]
    );
}

#[test]
fn crlf_split_between_chunks() {
    let rec = decode_all(&["a,b\r", "\nc,d\r\n"]);
    assert_eq!(rec.records(), vec![svec(&["a", "b"]), svec(&["c", "d"])]);
}

#[test]
fn several_records_in_one_chunk() {
    let mut dec = decoder();
    dec.handle_data(b"a\nb\nc\n");
    assert_eq!(
        dec.handler().records(),
        vec![svec(&["a"]), svec(&["b"]), svec(&["c"])]
    );
}

#[test]
fn blank_line_is_an_error() {
    let mut dec = decoder();
    dec.handle_data(b"\n");
    let rec = dec.handler();
    assert_eq!(rec.kinds(), vec!["error", "close"]);
    match *rec.errors()[0] {
        Error::Decode { kind: DecodeErrorKind::BlankLine, .. } => {}
        ref err => panic!("unexpected error: {:?}", err),
    }
    assert!(dec.is_closed());
    assert_eq!(dec.source().closes, 1);
}

#[test]
fn blank_line_after_records() {
    let mut dec = decoder();
    dec.handle_data(b"a\n\r\nb\n");
    assert_eq!(dec.handler().kinds(), vec!["record", "error", "close"]);
    let pos = dec.handler().errors()[0].position().unwrap().clone();
    assert_eq!(pos.record(), 1);
    assert_eq!(pos.line(), 2);
    assert_eq!(pos.byte(), 2);
}

#[test]
fn trailing_garbage_after_quote() {
    let mut dec = decoder();
    dec.handle_data(b"\"a\"b,c\n");
    let rec = dec.handler();
    assert_eq!(rec.kinds(), vec!["error", "close"]);
    match *rec.errors()[0] {
        Error::Decode {
            kind: DecodeErrorKind::TrailingGarbage { byte: b'b', .. },
            ..
        } => {}
        ref err => panic!("unexpected error: {:?}", err),
    }
}

#[test]
fn unterminated_quote_on_end() {
    let mut dec = decoder();
    dec.handle_data(b"\"hello\\\"test\n");
    assert!(dec.handler().events.is_empty());
    dec.handle_end();
    let rec = dec.handler();
    assert_eq!(rec.kinds(), vec!["error", "close"]);
    match *rec.errors()[0] {
        Error::Decode { kind: DecodeErrorKind::UnterminatedQuote, .. } => {}
        ref err => panic!("unexpected error: {:?}", err),
    }
}

#[test]
fn unterminated_quote_across_chunks() {
    let rec = decode_all(&["\"hello", "\\\"te", "st\n"]);
    assert_eq!(rec.kinds(), vec!["error", "close"]);
    assert_eq!(rec.ends(), 0);
}

#[test]
fn unterminated_quote_without_newline() {
    let rec = decode_all(&["\"hello\\\"test"]);
    assert_eq!(rec.kinds(), vec!["error", "close"]);
}

#[test]
fn exact_buffer_size() {
    let mut dec = DecoderBuilder::new()
        .max_buffer_len(5)
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"hello\n");
    assert_eq!(dec.handler().records(), vec![svec(&["hello"])]);
    assert!(!dec.is_closed());
}

#[test]
fn buffer_overflow() {
    let mut dec = DecoderBuilder::new()
        .max_buffer_len(4)
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"hello\n");
    let rec = dec.handler();
    assert_eq!(rec.kinds(), vec!["error", "close"]);
    assert!(rec.errors()[0].is_overflow());
    match *rec.errors()[0] {
        Error::Overflow { len: 6, limit: 4 } => {}
        ref err => panic!("unexpected error: {:?}", err),
    }
}

#[test]
fn overflow_without_newline() {
    let mut dec = DecoderBuilder::new()
        .max_buffer_len(4)
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"hel");
    assert!(dec.handler().events.is_empty());
    dec.handle_data(b"lo");
    assert!(dec.handler().errors()[0].is_overflow());
    assert!(dec.is_closed());
}

#[test]
fn many_short_records_fit_a_small_buffer() {
    let mut dec = DecoderBuilder::new()
        .max_buffer_len(2)
        .from_source(MockSource::new(), Recorder::new());
    dec.handle_data(b"a\nb\nc\nd\n");
    assert_eq!(dec.handler().records().len(), 4);
    assert!(dec.handler().errors().is_empty());
}

#[test]
fn end_is_forwarded() {
    let mut dec = decoder();
    dec.handle_end();
    assert_eq!(dec.handler().kinds(), vec!["end", "close"]);
    assert!(dec.is_closed());
}

#[test]
fn final_record_without_newline() {
    let mut dec = decoder();
    dec.handle_data(b"hello");
    dec.handle_end();
    assert_eq!(dec.handler().kinds(), vec!["record", "end", "close"]);
    assert_eq!(dec.handler().records(), vec![svec(&["hello"])]);
}

#[test]
fn close_is_forwarded_once() {
    let mut dec = decoder();
    dec.handle_close();
    dec.handle_close();
    dec.close();
    assert_eq!(dec.handler().kinds(), vec!["close"]);
    assert_eq!(dec.source().closes, 1);
}

#[test]
fn close_discards_buffer_and_ignores_input() {
    let mut dec = decoder();
    dec.handle_data(b"partial");
    dec.close();
    assert_eq!(dec.buffered_len(), 0);
    dec.handle_data(b"\nmore\n");
    dec.handle_end();
    assert_eq!(dec.handler().kinds(), vec!["close"]);
}

#[test]
fn close_from_final_record_suppresses_end() {
    let mut dec =
        Decoder::new(MockSource::new(), Recorder::closing_after(1));
    dec.handle_data(b"hello");
    dec.handle_end();
    assert_eq!(dec.handler().kinds(), vec!["record", "close"]);
    assert_eq!(dec.handler().ends(), 0);
}

#[test]
fn close_from_callback_drops_buffered_records() {
    let mut dec =
        Decoder::new(MockSource::new(), Recorder::closing_after(1));
    dec.handle_data(b"a\nb\nc\n");
    assert_eq!(dec.handler().kinds(), vec!["record", "close"]);
    assert_eq!(dec.source().closes, 1);
}

#[test]
fn unreadable_source_starts_closed() {
    let mut dec = Decoder::new(MockSource::unreadable(), Recorder::new());
    assert!(dec.is_closed());
    assert!(!dec.is_readable());
    dec.handle_data(b"hello\n");
    dec.handle_end();
    assert!(dec.handler().events.is_empty());
}

#[test]
fn error_is_forwarded_and_closes() {
    let mut dec = decoder();
    dec.handle_error(Error::stream("upstream failed"));
    assert_eq!(dec.handler().kinds(), vec!["error", "close"]);
    assert_eq!(
        dec.handler().errors()[0].to_string(),
        "stream error: upstream failed"
    );
    dec.handle_error(Error::stream("again"));
    assert_eq!(dec.handler().errors().len(), 1);
}

#[test]
fn pause_and_resume_are_forwarded() {
    let mut dec = decoder();
    dec.pause();
    assert!(dec.source().paused);
    dec.resume();
    assert!(!dec.source().paused);
    assert_eq!(dec.source().pauses, 1);
    assert_eq!(dec.source().resumes, 1);
}

#[test]
fn pause_from_callback() {
    let mut dec =
        Decoder::new(MockSource::new(), Recorder::pausing_after(1));
    dec.handle_data(b"a\n");
    assert!(dec.source().paused);
    assert!(!dec.is_closed());
}

#[test]
fn positions_advance() {
    let mut dec = decoder();
    dec.handle_data(b"a,\"x\ny\"\nb\n");
    let pos = dec.position();
    assert_eq!(pos.record(), 2);
    assert_eq!(pos.line(), 4);
    assert_eq!(pos.byte(), 10);
}

#[test]
fn collect_into_vec() {
    let mut dec = Decoder::new((), Vec::<ByteRecord>::new());
    dec.handle_data(b"a,b\nc,d");
    dec.handle_end();
    let records = dec.into_handler();
    assert_eq!(records, vec![
        ByteRecord::from(vec!["a", "b"]),
        ByteRecord::from(vec!["c", "d"]),
    ]);
}

#[test]
fn every_split_point_gives_the_same_records() {
    let data = "name,note\r\nalice,\"multi\nline\"\nbob,\"say \"\"hi\"\"\"\n\
                carol,\"esc \\\" aped\"\n";
    let whole = decode_all(&[data]).records();
    assert_eq!(whole.len(), 4);
    for i in 0..=data.len() {
        let (a, b) = data.split_at(i);
        assert_eq!(decode_all(&[a, b]).records(), whole, "split at {}", i);
    }
}
