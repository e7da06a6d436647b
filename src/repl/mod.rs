//! The read/evaluate loop.

pub mod state;

pub use state::{Action, Event, State};

use std::io::{BufRead, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::config::{Config, StatusReport};
use crate::exec::Runner;
use crate::parse;

/// Exit status when input ends in the middle of an unfinishable line.
pub const EXIT_INCOMPLETE: i32 = 2;

/// Reads lines, tracks continuation, and hands finished pipelines to a
/// [`Runner`].
pub struct Repl<R: Runner> {
    config: Config,
    runner: R,
}

impl<R: Runner> Repl<R> {
    pub fn new(config: Config, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Apply word expansions and operator spacing to one logical line.
    pub fn prepare_line(&self, raw: &str) -> String {
        parse::prepare_line(raw, &self.config.expansion, self.config.operators.quote_aware)
    }

    /// Run until input is exhausted. Prompts and the farewell go to `out`,
    /// diagnostics to `err`. Returns the process exit status to use.
    pub fn run<I, O, E>(&mut self, mut input: I, out: &mut O, err: &mut E) -> i32
    where
        I: BufRead,
        O: Write,
        E: Write,
    {
        let mut state = State::Fresh;
        let mut buf = String::new();

        loop {
            let prompt = state.prompt(&self.config.prompt.primary, &self.config.prompt.continuation);
            let _ = write!(out, "{prompt}");
            let _ = out.flush();

            let event = match read_line(&mut input, &mut buf) {
                Some(line) => Event::Line(line),
                None => Event::EndOfInput,
            };

            let (next, action) = state.advance(event, |raw| self.prepare_line(raw));
            state = next;

            match action {
                Action::Execute(tokens) => {
                    let _ = out.flush();
                    self.execute(&tokens, err);
                }
                Action::ReadMore => debug!("line continues"),
                Action::Report(message) => {
                    let _ = writeln!(err, "pipesh: {message}");
                }
                Action::Abort(message) => {
                    warn!("input ended mid-line: {message}");
                    let _ = writeln!(err, "\npipesh: {message}");
                    return EXIT_INCOMPLETE;
                }
                Action::Exit => {
                    let _ = writeln!(out, "\n{}", self.config.prompt.farewell);
                    let _ = out.flush();
                    info!("end of input, exiting");
                    return 0;
                }
            }
        }
    }

    /// Parse and run one tokenized logical line.
    fn execute<E: Write>(&mut self, tokens: &[String], err: &mut E) {
        let seq = parse::parse_in(tokens, Path::new("."), self.config.expansion.pathnames);
        if seq.is_empty() {
            return;
        }
        debug!("running {} stage(s)", seq.len());

        match self.runner.run(&seq) {
            Ok(status) => {
                let report = match self.config.status.report {
                    StatusReport::Never => false,
                    StatusReport::Failure => !status.success(),
                    StatusReport::Always => true,
                };
                if report {
                    let _ = writeln!(err, "pipesh: {}", status.termination());
                }
            }
            Err(e) if e.is_empty_command() => {
                debug!("ignoring empty command: {e}");
            }
            Err(e) => {
                warn!("pipeline failed: {e}");
                let _ = writeln!(err, "pipesh: {e}");
            }
        }
    }
}

/// Read one physical line without its line terminator. `None` at end of
/// input; read errors are treated the same way.
fn read_line<'b, I: BufRead>(input: &mut I, buf: &'b mut String) -> Option<&'b str> {
    buf.clear();
    match input.read_line(buf) {
        Ok(0) => None,
        Ok(_) => {
            let line: &'b str = buf;
            let line = line.strip_suffix('\n').unwrap_or(line);
            Some(line.strip_suffix('\r').unwrap_or(line))
        }
        Err(e) => {
            warn!("read failed: {e}");
            None
        }
    }
}
