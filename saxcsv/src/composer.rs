// SPDX-License-Identifier: Apache-2.0

//! Accumulates the bytes of the field currently being scanned.

use crate::config::{QUOTE, SPACE, TAB};
use crate::ErrorKind;

const INITIAL_CAPACITY: usize = 32;
const EQUALS: u8 = b'=';

/// Growable byte buffer for the field under construction.
///
/// The buffer only ever grows by single bytes; growth is left to `Vec`'s doubling
/// strategy. After a field is materialized the storage is handed off to the
/// returned `String` and a fresh allocation takes its place.
#[derive(Debug)]
pub(crate) struct Composer {
    buffer: Vec<u8>,
    /// While set, `append` drops bytes. Used between a possible closing quote and
    /// the byte that decides whether it was one.
    suppressed: bool,
    literal_preservation: bool,
}

impl Composer {
    pub fn new(literal_preservation: bool) -> Self {
        Self {
            buffer: Vec::with_capacity(INITIAL_CAPACITY),
            suppressed: false,
            literal_preservation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn last(&self) -> Option<u8> {
        self.buffer.last().copied()
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    pub fn append(&mut self, byte: u8) {
        if !self.suppressed {
            self.buffer.push(byte);
        }
    }

    /// Drops the last byte, if any.
    pub fn remove_last(&mut self) {
        self.buffer.pop();
    }

    /// Drops trailing spaces and tabs.
    pub fn trim_trailing_whitespace(&mut self) {
        while let Some(&last) = self.buffer.last() {
            if !matches!(last, SPACE | TAB) {
                break;
            }
            self.buffer.pop();
        }
    }

    /// Clears the buffer when an opening quote arrives.
    ///
    /// Only whitespace (and the `=` literal marker, when enabled) may precede the
    /// quote; anything else means the field is malformed.
    pub fn reset_for_quote(&mut self) -> Result<(), ErrorKind> {
        let literal = self.literal_preservation;
        let erasable = |&b: &u8| matches!(b, SPACE | TAB) || (literal && b == EQUALS);
        if !self.buffer.iter().all(erasable) {
            return Err(ErrorKind::CharsBeforeQuote);
        }
        self.buffer.clear();
        Ok(())
    }

    /// Produces the field value and resets the buffer.
    ///
    /// An empty buffer yields `Some("")` when `empty_string_for_none` is set (a
    /// quoted field was seen) and `None` otherwise.
    pub fn materialize(&mut self, empty_string_for_none: bool) -> Result<Option<String>, ErrorKind> {
        let mut bytes = core::mem::replace(&mut self.buffer, Vec::with_capacity(INITIAL_CAPACITY));
        self.suppressed = false;

        if self.literal_preservation && is_literal_shape(&bytes) {
            // ="payload" -> payload
            bytes.pop();
            bytes.drain(..2);
        }

        if bytes.is_empty() {
            return Ok(empty_string_for_none.then(String::new));
        }
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Some(s)),
            Err(e) => Err(ErrorKind::InvalidUtf8(e.utf8_error())),
        }
    }
}

fn is_literal_shape(bytes: &[u8]) -> bool {
    bytes.len() > 3
        && bytes.first() == Some(&EQUALS)
        && bytes.get(1) == Some(&QUOTE)
        && bytes.last() == Some(&QUOTE)
}
