// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;

/// Receives events from a [`PushParser`](crate::PushParser) as bytes are fed.
///
/// Every method defaults to a no-op, so a handler only implements the events it
/// cares about. `()` is the handler that ignores everything.
///
/// For one document the events arrive as `begin_document`, then per record
/// `begin_line`, one `read_field` per field and `end_line`, and finally either
/// `end_document` or a single `fail`.
pub trait CsvHandler {
    fn begin_document(&mut self) {}

    fn end_document(&mut self) {}

    /// A record starts. `record` is the 0-based line index, header included.
    fn begin_line(&mut self, _record: usize) {}

    /// A record ends after its field count (and decode, if any) was accepted.
    fn end_line(&mut self, _record: usize) {}

    /// A field was completed. `None` is an unquoted empty field.
    fn read_field(&mut self, _value: Option<&str>, _index: usize) {}

    /// Parsing stopped; no further events follow for this document.
    fn fail(&mut self, _error: &ParseError) {}
}

impl CsvHandler for () {}

impl<H: CsvHandler + ?Sized> CsvHandler for &mut H {
    fn begin_document(&mut self) {
        (**self).begin_document()
    }

    fn end_document(&mut self) {
        (**self).end_document()
    }

    fn begin_line(&mut self, record: usize) {
        (**self).begin_line(record)
    }

    fn end_line(&mut self, record: usize) {
        (**self).end_line(record)
    }

    fn read_field(&mut self, value: Option<&str>, index: usize) {
        (**self).read_field(value, index)
    }

    fn fail(&mut self, error: &ParseError) {
        (**self).fail(error)
    }
}
