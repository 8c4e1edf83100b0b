// SPDX-License-Identifier: Apache-2.0

//! A SAX-style push parser for delimiter-separated text.
//!
//! Feed bytes in chunks of any size to a [`PushParser`]; it reports document,
//! record and field boundaries to a [`CsvHandler`] as they are recognized and
//! collects the raw records. Given a target type implementing [`CsvRecord`]
//! (or an explicit [`Schema`]), it also decodes every data record, using the
//! header row to map columns onto properties.
//!
//! ```rust
//! use saxcsv::{CsvConfig, CsvRecord, PushParser, DEFAULTED_FIELDS_HEADER};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Row {
//!     x: bool,
//!     y: String,
//!     i: i64,
//!     defaulted: Option<Vec<String>>,
//! }
//!
//! impl CsvRecord for Row {
//!     fn default_values() -> Self {
//!         Row { x: true, y: "d".into(), i: 0, defaulted: None }
//!     }
//!
//!     fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
//!         &[("x", "xx"), ("y", "yy"), ("i", "ii"), ("defaulted", DEFAULTED_FIELDS_HEADER)]
//!     }
//! }
//!
//! let mut parser = PushParser::<_, Row>::decoding((), CsvConfig::default());
//! parser.feed(b"xx,yy,ii\n,hello,42\n").unwrap();
//! parser.close().unwrap();
//!
//! let rows = parser.take_decoded();
//! assert!(rows[0].x);
//! assert_eq!(rows[0].y, "hello");
//! assert_eq!(rows[0].i, 42);
//! assert_eq!(rows[0].defaulted, Some(vec!["x".to_string()]));
//! ```

mod composer;

mod config;
pub use config::{CsvConfig, CsvConfigBuilder};

mod decoder;
pub use decoder::{
    CsvDecoder, CsvRecord, FieldDescriptor, PropertyKind, PropertyValue, RecordMap, Schema,
    DEFAULTED_FIELDS_HEADER, DEFAULT_FALSE_STRINGS, RECORD_NUMBER_HEADER,
};

mod handler;
pub use handler::CsvHandler;

mod parse_error;
pub use parse_error::{ConfigError, DecodeError, ErrorKind, ParseError, QuoteScope, SchemaError};

mod push_parser;
pub use push_parser::{PushParser, StreamStatus};

mod tokenizer;
