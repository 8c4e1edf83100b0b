// SPDX-License-Identifier: Apache-2.0

//! Per-state byte dispatch for the CSV state machine.
//!
//! Every state owns a 256-entry table of [`Action`]s for the bytes that are
//! structural in that state; all other bytes go to the state's generic
//! [`CharMode`]. The table is rebuilt on state entry so the per-byte path is a
//! single lookup. The tokenizer only classifies bytes; the parser performs the
//! actions.

use crate::config::{CsvConfig, CR, DEL, LF, QUOTE, SPACE, TAB};

/// Parser state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// At the start of a line, checking for the comment marker.
    LookForComment,
    /// Skipping a comment line.
    InsideComment,
    /// Scanning an unquoted field.
    Normal,
    /// Inside a quoted field.
    QuotedField,
    /// Just saw a quote that may close the field.
    QuoteSeen,
    /// Saw a closing quote followed by whitespace.
    QuoteSeenAwaitEnd,
    Closed,
    Error,
}

/// Bound behavior for a structural byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Non-printing byte outside a structural position.
    ControlCharacter,
    /// Comment marker at the start of a line.
    BeginComment,
    /// Line feed ending a comment line.
    EndComment,
    /// Quote opening a field.
    OpenQuote,
    /// Quote inside a quoted field, or after a closing quote and whitespace.
    InnerQuote,
    /// Quote directly after a possible closing quote: an escaped quote.
    EscapedQuote,
    Delimiter,
    /// CR in an unquoted field: kept until a following LF retracts it.
    CarriageReturn,
    /// CR after a closing quote.
    DropByte,
    LineFeed,
    /// Whitespace after a closing quote.
    SpaceAfterQuote,
}

/// What the active state does with bytes that have no bound action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharMode {
    /// Append to the field buffer.
    Accumulate,
    /// Skip spaces and tabs; the first other byte switches to `Accumulate`.
    SkipLeadingWhitespace,
    /// Leave comment lookahead, then reprocess the byte in `Normal`.
    NotComment,
    /// Anything after a closing quote is an error.
    RejectAfterQuote,
    Ignore,
}

/// Result of classifying one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Act(Action),
    Char(CharMode),
}

pub(crate) struct Tokenizer {
    state: State,
    mode: CharMode,
    actions: [Option<Action>; 256],
    delimiter: u8,
    comment_marker: u8,
    trim_whitespace: bool,
    allow_comments: bool,
}

impl Tokenizer {
    pub fn new(config: &CsvConfig) -> Self {
        let mut tokenizer = Self {
            state: State::Closed,
            mode: CharMode::Ignore,
            actions: [None; 256],
            delimiter: config.delimiter(),
            comment_marker: config.comment_marker(),
            trim_whitespace: config.trim_whitespace(),
            allow_comments: config.allow_comments(),
        };
        tokenizer.reset();
        tokenizer
    }

    /// Restores the control byte bindings and enters the line-initial state.
    pub fn reset(&mut self) {
        self.actions = [None; 256];
        for byte in (0u8..0x20).chain(core::iter::once(DEL)) {
            self.actions[usize::from(byte)] = Some(Action::ControlCharacter);
        }
        self.state = State::Closed;
        self.enter(self.initial_state());
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// State at the start of every line.
    pub fn initial_state(&self) -> State {
        if self.allow_comments {
            State::LookForComment
        } else {
            State::Normal
        }
    }

    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, State::Closed | State::Error)
    }

    pub fn classify(&self, byte: u8) -> Step {
        match self.actions[usize::from(byte)] {
            Some(action) => Step::Act(action),
            None => Step::Char(self.mode),
        }
    }

    /// Called once the first non-whitespace byte of a trimmed field arrives.
    pub fn stop_skipping_whitespace(&mut self) {
        if self.mode == CharMode::SkipLeadingWhitespace {
            self.mode = CharMode::Accumulate;
        }
    }

    /// Switches state and rebinds the structural bytes for it.
    pub fn enter(&mut self, state: State) {
        if self.state == State::Error {
            return;
        }
        log::trace!("state {:?} -> {:?}", self.state, state);

        for byte in [QUOTE, SPACE, TAB, CR, LF, self.delimiter] {
            self.actions[usize::from(byte)] = None;
        }
        if self.allow_comments {
            self.actions[usize::from(self.comment_marker)] = None;
        }
        // From here on CR, LF and TAB reach the generic handler unless bound below

        self.mode = match state {
            State::LookForComment => {
                self.bind(self.comment_marker, Action::BeginComment);
                self.bind(LF, Action::LineFeed);
                CharMode::NotComment
            }
            State::InsideComment => {
                self.bind(LF, Action::EndComment);
                CharMode::Ignore
            }
            State::Normal => {
                self.bind(QUOTE, Action::OpenQuote);
                self.bind(CR, Action::CarriageReturn);
                self.bind(LF, Action::LineFeed);
                self.bind(self.delimiter, Action::Delimiter);
                if self.trim_whitespace {
                    CharMode::SkipLeadingWhitespace
                } else {
                    CharMode::Accumulate
                }
            }
            State::QuotedField => {
                self.bind(QUOTE, Action::InnerQuote);
                CharMode::Accumulate
            }
            State::QuoteSeen | State::QuoteSeenAwaitEnd => {
                let quote = if state == State::QuoteSeen {
                    Action::EscapedQuote
                } else {
                    Action::InnerQuote
                };
                self.bind(QUOTE, quote);
                self.bind(SPACE, Action::SpaceAfterQuote);
                self.bind(TAB, Action::SpaceAfterQuote);
                self.bind(CR, Action::DropByte);
                self.bind(LF, Action::LineFeed);
                // Bound last so a TAB delimiter wins over whitespace
                self.bind(self.delimiter, Action::Delimiter);
                CharMode::RejectAfterQuote
            }
            State::Closed | State::Error => CharMode::Ignore,
        };
        self.state = state;
    }

    fn bind(&mut self, byte: u8, action: Action) {
        self.actions[usize::from(byte)] = Some(action);
    }
}
