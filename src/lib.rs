//! pipesh: a line-oriented command interpreter.
//!
//! Each logical line is expanded, spaced around operators, tokenized with
//! shell quoting rules, split into pipeline stages at `|`, and run as a
//! chain of forked processes joined by pipes. A trailing naked backslash
//! continues the logical line onto the next physical one.
//!
//! # Architecture
//!
//! - **[`parse`]** — Operator spacing, shlex tokenizer, word and pathname expansion, pipeline parser.
//! - **[`exec`]** — Process orchestration: pipes, fork/exec, descriptor wiring, reaping.
//! - **[`repl`]** — Continuation state machine and the read/evaluate loop.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — File logging to `~/.local/share/pipesh/pipesh.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Pipeline execution: fork, pipe, exec, wait.
pub mod exec;
/// File-based logging setup.
pub mod logging;
/// Line preprocessing, tokenizing, and pipeline parsing.
pub mod parse;
/// Read/evaluate loop with line continuation.
pub mod repl;

use parse::{CommandSequence, Lexed};

/// Turn one complete logical line into a pipeline using the default
/// configuration, exactly as the REPL would before running it.
///
/// Returns `None` when the line needs a continuation or fails to lex.
pub fn parse_line(line: &str) -> Option<CommandSequence> {
    let config = config::Config::default_config();
    let spaced = parse::prepare_line(line, &config.expansion, config.operators.quote_aware);
    match parse::tokenize(&spaced) {
        Lexed::Complete(tokens) => Some(parse::parse(&tokens)),
        Lexed::NeedsMoreInput | Lexed::LexError(_) => None,
    }
}
