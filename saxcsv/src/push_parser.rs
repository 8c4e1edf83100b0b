// SPDX-License-Identifier: Apache-2.0

//! A SAX-style CSV push parser.
//!
//! Bytes are fed in arbitrary chunks; field, line and document events are
//! delivered to a [`CsvHandler`] as soon as they are complete. When a target
//! record type is supplied the parser also builds a [`CsvDecoder`] from the
//! header row and decodes every data record.

use serde::de::DeserializeOwned;

use crate::composer::Composer;
use crate::config::{CR, QUOTE, SPACE, TAB};
use crate::decoder::{CsvDecoder, CsvRecord, RecordMap, Schema};
use crate::tokenizer::{Action, CharMode, State, Step, Tokenizer};
use crate::{CsvConfig, CsvHandler, DecodeError, ErrorKind, ParseError, QuoteScope, SchemaError};

/// Lifecycle of the document being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Nothing fed yet.
    NotOpen,
    /// `begin_document` was emitted.
    Open,
    /// At least one chunk was fed.
    Writing,
    /// A blank line ended the document; remaining bytes are ignored.
    AtEnd,
    Closed,
    Error,
}

type DecodeFn<R> = fn(&CsvDecoder, usize, &RecordMap) -> Result<R, DecodeError>;
type Scrubber = Box<dyn FnMut(RecordMap) -> RecordMap>;

enum SchemaSource {
    Declared(Schema),
    Derived(fn() -> Result<Schema, SchemaError>),
}

/// What record 0 is turned into a decoder with, and how data records become `R`.
struct Target<R> {
    schema: SchemaSource,
    decode: DecodeFn<R>,
}

/// A SAX-style CSV push parser.
///
/// # Generic Parameters
///
/// * `H` - The event handler type that implements [`CsvHandler`]
/// * `R` - The decoded record type; `()` when only events are wanted
///
/// ```rust
/// use saxcsv::{CsvConfig, PushParser};
///
/// let mut parser = PushParser::new((), CsvConfig::default());
/// parser.feed(b"name,count\nwidget,").unwrap();
/// parser.feed(b"4\n").unwrap();
/// parser.close().unwrap();
///
/// assert_eq!(parser.headers(), ["name", "count"]);
/// let records = parser.take_records();
/// assert_eq!(records[1], [Some("widget".to_string()), Some("4".to_string())]);
/// ```
pub struct PushParser<H, R = ()> {
    handler: H,
    config: CsvConfig,
    tokenizer: Tokenizer,
    composer: Composer,
    status: StreamStatus,
    /// Quotes seen in the current field
    quote_count: usize,
    field_number: usize,
    record_number: usize,
    num_fields: usize,
    headers: Vec<String>,
    /// Completed fields of the current line
    line: Vec<Option<String>>,
    /// Fields of the current line not yet handed out by `take_fields`
    fields: Vec<Option<String>>,
    records: Vec<Vec<Option<String>>>,
    target: Option<Target<R>>,
    decoder: Option<CsvDecoder>,
    decoded: Vec<R>,
    scrubber: Option<Scrubber>,
    error: Option<ParseError>,
}

impl<H: CsvHandler> PushParser<H> {
    /// Creates a parser that only emits events and collects raw records.
    pub fn new(handler: H, config: CsvConfig) -> Self {
        Self::with_target(handler, config, None)
    }
}

impl<H: CsvHandler, R> PushParser<H, R> {
    /// Creates a parser that decodes every data record into `R`, using the
    /// schema derived from `R`'s default instance.
    pub fn decoding(handler: H, config: CsvConfig) -> Self
    where
        R: CsvRecord,
    {
        let target = Target {
            schema: SchemaSource::Derived(Schema::for_record::<R>),
            decode: CsvDecoder::decode::<R>,
        };
        Self::with_target(handler, config, Some(target))
    }

    /// Creates a parser that decodes every data record into `R` with an
    /// explicitly declared schema.
    pub fn decoding_with_schema(handler: H, config: CsvConfig, schema: Schema) -> Self
    where
        R: DeserializeOwned,
    {
        let target = Target {
            schema: SchemaSource::Declared(schema),
            decode: deserialize_record::<R>,
        };
        Self::with_target(handler, config, Some(target))
    }

    fn with_target(handler: H, config: CsvConfig, target: Option<Target<R>>) -> Self {
        Self {
            handler,
            tokenizer: Tokenizer::new(&config),
            composer: Composer::new(config.literal_preservation()),
            config,
            status: StreamStatus::NotOpen,
            quote_count: 0,
            field_number: 0,
            record_number: 0,
            num_fields: 0,
            headers: Vec::new(),
            line: Vec::new(),
            fields: Vec::new(),
            records: Vec::new(),
            target,
            decoder: None,
            decoded: Vec::new(),
            scrubber: None,
            error: None,
        }
    }

    /// Installs a transform applied to each record map right before decoding.
    #[must_use]
    pub fn with_scrubber<F>(mut self, scrubber: F) -> Self
    where
        F: FnMut(RecordMap) -> RecordMap + 'static,
    {
        self.scrubber = Some(Box::new(scrubber));
        self
    }

    /// Resets all state and starts a new document.
    pub fn open(&mut self) {
        self.tokenizer.reset();
        self.composer = Composer::new(self.config.literal_preservation());
        self.quote_count = 0;
        self.field_number = 0;
        self.record_number = 0;
        self.num_fields = 0;
        self.headers.clear();
        self.line.clear();
        self.fields.clear();
        self.records.clear();
        self.decoder = None;
        self.decoded.clear();
        self.error = None;
        self.status = StreamStatus::Open;
        log::debug!("document opened");
        self.handler.begin_document();
    }

    /// Processes a chunk of input and returns the number of bytes accepted.
    ///
    /// Chunk boundaries may fall anywhere. After the document ended (a blank
    /// line or [`close`](Self::close)) input is accepted and ignored. After a
    /// failure every call returns the retained error.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        match self.status {
            StreamStatus::NotOpen => self.open(),
            StreamStatus::AtEnd | StreamStatus::Closed => return Ok(data.len()),
            StreamStatus::Open | StreamStatus::Writing | StreamStatus::Error => {}
        }
        self.status = StreamStatus::Writing;

        for &byte in data {
            if let Err(kind) = self.process(byte) {
                return Err(self.fail(kind));
            }
            if self.status == StreamStatus::AtEnd {
                break;
            }
        }
        Ok(data.len())
    }

    /// Finishes the document. End of input counts as a final line terminator.
    pub fn close(&mut self) -> Result<(), ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        match self.status {
            StreamStatus::Open | StreamStatus::Writing => {
                if let Err(kind) = self.end_line() {
                    return Err(self.fail(kind));
                }
                if self.status != StreamStatus::AtEnd {
                    self.end_document();
                }
            }
            StreamStatus::NotOpen
            | StreamStatus::AtEnd
            | StreamStatus::Closed
            | StreamStatus::Error => {}
        }
        self.tokenizer.enter(State::Closed);
        self.status = StreamStatus::Closed;
        Ok(())
    }

    /// Returns and clears the completed fields of the line in progress.
    ///
    /// Draining does not affect the line itself: it still becomes a record
    /// and is still decoded once complete.
    pub fn take_fields(&mut self) -> Vec<Option<String>> {
        core::mem::take(&mut self.fields)
    }

    /// Returns and clears the completed records, header row included.
    pub fn take_records(&mut self) -> Vec<Vec<Option<String>>> {
        core::mem::take(&mut self.records)
    }

    /// Returns and clears the decoded data records.
    pub fn take_decoded(&mut self) -> Vec<R> {
        core::mem::take(&mut self.decoded)
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// The error that stopped the current document, if any.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Column names of the current document, once record 0 is complete.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records completed so far, header row included.
    pub fn record_count(&self) -> usize {
        self.record_number
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    pub fn decoder(&self) -> Option<&CsvDecoder> {
        self.decoder.as_ref()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Destroys the parser and returns the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    fn process(&mut self, byte: u8) -> Result<(), ErrorKind> {
        match self.tokenizer.classify(byte) {
            Step::Act(action) => self.act(action, byte),
            Step::Char(mode) => self.character(mode, byte),
        }
    }

    fn act(&mut self, action: Action, byte: u8) -> Result<(), ErrorKind> {
        match action {
            Action::ControlCharacter => return Err(ErrorKind::ControlCharacter(byte)),
            Action::BeginComment => self.tokenizer.enter(State::InsideComment),
            Action::EndComment => self.tokenizer.enter(State::LookForComment),
            Action::OpenQuote => {
                self.composer.reset_for_quote()?;
                self.quote_count += 1;
                self.tokenizer.enter(State::QuotedField);
            }
            Action::InnerQuote => {
                self.quote_count += 1;
                if self.quote_count % 2 == 0 {
                    // Possibly the closing quote; the next byte decides
                    self.composer.set_suppressed(true);
                    self.tokenizer.enter(State::QuoteSeen);
                } else {
                    self.composer.set_suppressed(false);
                    self.tokenizer.enter(State::QuotedField);
                }
            }
            Action::EscapedQuote => {
                self.composer.set_suppressed(false);
                self.composer.append(QUOTE);
                self.quote_count += 1;
                self.tokenizer.enter(State::QuotedField);
            }
            Action::Delimiter => self.end_field()?,
            Action::CarriageReturn => {
                self.tokenizer.stop_skipping_whitespace();
                self.composer.append(byte);
            }
            Action::DropByte => {}
            Action::LineFeed => self.end_line()?,
            Action::SpaceAfterQuote => {
                if self.tokenizer.state() != State::QuoteSeenAwaitEnd {
                    self.tokenizer.enter(State::QuoteSeenAwaitEnd);
                }
            }
        }
        Ok(())
    }

    fn character(&mut self, mode: CharMode, byte: u8) -> Result<(), ErrorKind> {
        match mode {
            CharMode::Accumulate => self.composer.append(byte),
            CharMode::SkipLeadingWhitespace => {
                if !matches!(byte, SPACE | TAB) {
                    self.tokenizer.stop_skipping_whitespace();
                    self.composer.append(byte);
                }
            }
            CharMode::NotComment => {
                self.tokenizer.enter(State::Normal);
                return self.process(byte);
            }
            CharMode::RejectAfterQuote => {
                return Err(ErrorKind::ExtraneousCharacter(byte))
            }
            CharMode::Ignore => {}
        }
        Ok(())
    }

    fn end_field(&mut self) -> Result<(), ErrorKind> {
        if self.quote_count % 2 != 0 {
            return Err(ErrorKind::QuoteCountMismatch(QuoteScope::Field));
        }
        if self.field_number == 0 {
            self.handler.begin_line(self.record_number);
        }

        let quoted = self.quote_count > 0;
        if self.config.trim_whitespace() && !quoted {
            self.composer.trim_trailing_whitespace();
        }
        let value = self.composer.materialize(quoted)?;
        self.handler.read_field(value.as_deref(), self.field_number);
        self.fields.push(value.clone());
        self.line.push(value);

        self.field_number += 1;
        self.quote_count = 0;
        self.tokenizer.enter(State::Normal);
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), ErrorKind> {
        // A CR right before the terminator belongs to the terminator
        if self.tokenizer.state() == State::Normal && self.composer.last() == Some(CR) {
            self.composer.remove_last();
        }
        if self.field_number == 0 && self.quote_count == 0 && self.composer.is_empty() {
            self.end_document();
            return Ok(());
        }
        if self.quote_count % 2 != 0 {
            return Err(ErrorKind::QuoteCountMismatch(QuoteScope::Line));
        }
        self.end_field()?;

        if self.record_number == 0 {
            self.num_fields = self.field_number;
            self.headers = if self.config.has_header() {
                self.line
                    .iter()
                    .map(|f| f.clone().unwrap_or_default())
                    .collect()
            } else {
                (0..self.num_fields).map(|i| i.to_string()).collect()
            };
            if let Some(target) = &self.target {
                let schema = match &target.schema {
                    SchemaSource::Declared(schema) => schema.clone(),
                    SchemaSource::Derived(derive) => derive()?,
                };
                self.decoder = Some(CsvDecoder::new(schema, &self.headers)?);
            }
        } else if self.field_number != self.num_fields {
            return Err(ErrorKind::FieldCountMismatch {
                expected: self.num_fields,
                found: self.field_number,
            });
        }

        let is_header = self.record_number == 0 && self.config.has_header();
        if let (Some(target), Some(decoder), false) = (&self.target, &self.decoder, is_header) {
            let record = self.record_number - usize::from(self.config.has_header());
            let mut values = decoder.record_map(&self.line);
            if let Some(scrub) = self.scrubber.as_mut() {
                values = scrub(values);
            }
            let decoded = (target.decode)(decoder, record, &values)?;
            self.decoded.push(decoded);
        }

        log::debug!(
            "record {} complete with {} fields",
            self.record_number,
            self.field_number
        );
        self.handler.end_line(self.record_number);
        self.records.push(core::mem::take(&mut self.line));
        self.fields.clear();
        self.record_number += 1;
        self.field_number = 0;
        self.tokenizer.enter(self.tokenizer.initial_state());
        Ok(())
    }

    fn end_document(&mut self) {
        log::debug!("document ended after {} records", self.record_number);
        self.handler.end_document();
        self.tokenizer.enter(State::Closed);
        self.status = StreamStatus::AtEnd;
    }

    fn fail(&mut self, kind: ErrorKind) -> ParseError {
        let error = ParseError::new(kind, self.record_number);
        log::warn!("parse failed: {}", error);
        self.handler.fail(&error);
        self.tokenizer.enter(State::Error);
        self.status = StreamStatus::Error;
        self.error = Some(error.clone());
        error
    }
}

fn deserialize_record<R: DeserializeOwned>(
    decoder: &CsvDecoder,
    record: usize,
    values: &RecordMap,
) -> Result<R, DecodeError> {
    let value = decoder.decode_value(record, values)?;
    serde_json::from_value(value).map_err(|e| DecodeError::Rejected {
        record,
        message: e.to_string(),
    })
}
