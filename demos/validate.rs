// Re-encodes CSV data from stdin to stdout. Invalid input is reported on
// stderr with exit code 1, after everything before it has been written.
//
//     $ cargo run --example validate -- ';' < users.csv
use std::{env, error::Error, io, process};

use csv_stream::io::{ReadSource, WriteSink};
use csv_stream::{DecoderBuilder, EncodeHandler, EncoderBuilder, Transcode};

/// Remembers why the output side gave up, if it did.
#[derive(Default)]
struct Failure(Option<csv_stream::Error>);

impl EncodeHandler for Failure {
    fn error(&mut self, err: csv_stream::Error) {
        self.0 = Some(err);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let delimiter = match env::args().nth(1) {
        None => b',',
        Some(arg) if arg.len() == 1 => arg.as_bytes()[0],
        Some(arg) => {
            return Err(From::from(format!(
                "delimiter must be a single byte, got {:?}",
                arg
            )))
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let enc = EncoderBuilder::new()
        .delimiter(delimiter)
        .from_sink(WriteSink::new(stdout.lock()), Failure::default());
    let mut dec = DecoderBuilder::new()
        .delimiter(delimiter)
        .from_source(ReadSource::new(stdin.lock()), Transcode::new(enc));
    dec.drive();

    let pipe = dec.into_handler();
    log::info!(
        "{} records, {} bytes written",
        pipe.counter().records(),
        pipe.counter().bytes()
    );
    let (enc, decode_err) = pipe.into_parts();
    let (_, Failure(encode_err)) = enc.into_parts();
    match decode_err.or(encode_err) {
        None => Ok(()),
        Some(err) => Err(From::from(err)),
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("ERROR: {}", err);
        process::exit(1);
    }
}
