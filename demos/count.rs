// Counts the records (rows minus the header row) of CSV data on stdin.
//
//     $ cargo run --example count -- ';' < users.csv
use std::{env, error::Error, io, process};

use csv_stream::{AssocHandler, AssocRecord, Control, DecoderBuilder};
use csv_stream::io::ReadSource;

#[derive(Default)]
struct Count {
    records: u64,
    error: Option<csv_stream::Error>,
}

impl AssocHandler for Count {
    fn record(&mut self, _: AssocRecord, _: &mut Control<'_>) {
        self.records += 1;
    }

    fn error(&mut self, err: csv_stream::Error) {
        self.error = Some(err);
    }
}

fn run() -> Result<u64, Box<dyn Error>> {
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
    let mut dec = DecoderBuilder::new()
        .delimiter(delimiter)
        .assoc(ReadSource::new(stdin.lock()), Count::default());
    dec.drive();

    let count = dec.into_handler().into_inner();
    match count.error {
        None => Ok(count.records),
        Some(err) => Err(From::from(format!(
            "after record {}: {}",
            count.records, err
        ))),
    }
}

fn main() {
    env_logger::init();
    match run() {
        Ok(count) => println!("{}", count),
        Err(err) => {
            eprintln!("ERROR {}", err);
            process::exit(1);
        }
    }
}
