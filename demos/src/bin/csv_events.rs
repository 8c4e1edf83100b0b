// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use saxcsv::{CsvConfig, CsvHandler, ParseError, PushParser};

/// Feed a delimited text file to the push parser in fixed-size chunks and
/// print every event it reports.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to parse
    path: PathBuf,

    /// Field delimiter (a single ASCII character, or "tab")
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// Treat the first record as data
    #[arg(long)]
    no_header: bool,

    /// Trim spaces and tabs around unquoted fields
    #[arg(long)]
    trim: bool,

    /// Unwrap ="..." fields
    #[arg(long)]
    literal: bool,

    /// Skip lines starting with the comment marker
    #[arg(long)]
    comments: bool,

    /// Bytes per feed call
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,
}

struct Printer {
    fields: usize,
}

impl CsvHandler for Printer {
    fn begin_document(&mut self) {
        println!("begin document");
    }

    fn end_document(&mut self) {
        println!("end document");
    }

    fn begin_line(&mut self, record: usize) {
        println!("record {}", record);
    }

    fn end_line(&mut self, record: usize) {
        println!("end record {}", record);
    }

    fn read_field(&mut self, value: Option<&str>, index: usize) {
        self.fields += 1;
        match value {
            Some(text) => println!("  [{}] {:?}", index, text),
            None => println!("  [{}] null", index),
        }
    }

    fn fail(&mut self, error: &ParseError) {
        println!("failed: {}", error);
    }
}

fn parse_delimiter(spec: &str) -> Option<u8> {
    match spec {
        "tab" | "\\t" => Some(b'\t'),
        _ => match spec.as_bytes() {
            [byte] => Some(*byte),
            _ => None,
        },
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let Some(delimiter) = parse_delimiter(&args.delimiter) else {
        eprintln!("Error: invalid delimiter {:?}", args.delimiter);
        std::process::exit(2);
    };
    let config = match CsvConfig::builder()
        .delimiter(delimiter)
        .has_header(!args.no_header)
        .trim_whitespace(args.trim)
        .literal_preservation(args.literal)
        .allow_comments(args.comments)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let mut file = match File::open(&args.path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Error: Unable to open file '{}': {}",
                args.path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let mut parser = PushParser::new(Printer { fields: 0 }, config);
    let mut chunk = vec![0u8; args.chunk_size.max(1)];
    loop {
        let read = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                eprintln!("Error: Unable to read file '{}': {}", args.path.display(), e);
                std::process::exit(1);
            }
        };
        log::debug!("feeding {} bytes", read);
        if parser.feed(&chunk[..read]).is_err() {
            std::process::exit(1);
        }
    }
    if parser.close().is_err() {
        std::process::exit(1);
    }

    let records = parser.record_count();
    let headers = parser.headers().join(", ");
    let printer = parser.into_handler();
    println!(
        "{} records, {} fields, columns: {}",
        records, printer.fields, headers
    );
}
