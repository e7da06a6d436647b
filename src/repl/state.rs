//! Line-continuation state machine.
//!
//! Each transition consumes the current [`State`] and one input event and
//! yields the next state plus an [`Action`] for the driver to carry out.
//! Pending input is kept raw; expansions and operator spacing run over the
//! whole joined logical line, so a `$VAR` or an operator run may straddle
//! the break.

use crate::parse::{Lexed, strip_continuation, tokenize};

/// Where the driver stands between reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    /// No pending input; show the primary prompt.
    #[default]
    Fresh,
    /// A line ended in a naked backslash; `partial` holds everything read
    /// so far, unexpanded, with those backslashes removed.
    Continuing { partial: String },
}

/// One thing the reader produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// A physical line as read, newline removed.
    Line(&'a str),
    EndOfInput,
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A full logical line tokenized; parse and run it.
    Execute(Vec<String>),
    /// Read another line with the continuation prompt.
    ReadMore,
    /// Tell the user about a lexical error, then keep going.
    Report(String),
    /// Input is exhausted with a logical line that cannot be finished.
    Abort(String),
    /// Input is exhausted and nothing is pending.
    Exit,
}

impl State {
    pub fn is_continuing(&self) -> bool {
        matches!(self, State::Continuing { .. })
    }

    /// Pick the prompt for the next read.
    pub fn prompt<'p>(&self, primary: &'p str, continuation: &'p str) -> &'p str {
        match self {
            State::Fresh => primary,
            State::Continuing { .. } => continuation,
        }
    }

    /// Consume an event and move to the next state.
    ///
    /// `prepare` turns a raw logical line into the text handed to the
    /// tokenizer (word expansions and operator spacing).
    pub fn advance<P>(self, event: Event<'_>, prepare: P) -> (State, Action)
    where
        P: Fn(&str) -> String,
    {
        match (self, event) {
            (State::Fresh, Event::EndOfInput) => (State::Fresh, Action::Exit),
            (State::Fresh, Event::Line(line)) => lex(line.to_string(), prepare),
            (State::Continuing { mut partial }, Event::Line(line)) => {
                partial.push_str(line);
                lex(partial, prepare)
            }
            // Behave as if one last empty line arrived
            (State::Continuing { partial }, Event::EndOfInput) => {
                match tokenize(&prepare(&partial)) {
                    Lexed::Complete(tokens) => (State::Fresh, Action::Execute(tokens)),
                    Lexed::NeedsMoreInput => {
                        (State::Fresh, Action::Abort("unexpected end of input".into()))
                    }
                    Lexed::LexError(message) => (
                        State::Fresh,
                        Action::Abort(format!("unexpected end of input: {message}")),
                    ),
                }
            }
        }
    }
}

fn lex<P: Fn(&str) -> String>(raw: String, prepare: P) -> (State, Action) {
    match tokenize(&prepare(&raw)) {
        Lexed::Complete(tokens) => (State::Fresh, Action::Execute(tokens)),
        Lexed::NeedsMoreInput => {
            let partial = strip_continuation(&raw).to_string();
            (State::Continuing { partial }, Action::ReadMore)
        }
        Lexed::LexError(message) => (State::Fresh, Action::Report(message)),
    }
}
