//! Types produced by the parse layer and consumed by the exec layer.

use std::os::fd::RawFd;

use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};

/// Outcome of tokenizing one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexed {
    /// The line split cleanly into words.
    Complete(Vec<String>),
    /// The line ends in a naked backslash: read another line and retry
    /// with the two concatenated (minus the backslash).
    NeedsMoreInput,
    /// Malformed quoting unrelated to a trailing backslash.
    LexError(String),
}

/// One pipeline stage: its argument vector.
///
/// `args[0]` is both the program looked up on `PATH` and the `argv[0]`
/// the program receives. A stage with no arguments can be produced by a
/// dangling `|` or a glob that matched nothing; the exec layer rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<String>,
}

impl Command {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    /// Program name, if the stage has any arguments at all.
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Full argument vector, including the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// A pipeline: stages in execution order plus the descriptors it reads
/// from and writes to as a whole.
///
/// Only the first stage reads `input`; only the last writes `output`.
/// Every stage shares `error`. The slots are borrowed: whoever built the
/// sequence keeps ownership of those descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSequence {
    pub commands: Vec<Command>,
    pub input: RawFd,
    pub output: RawFd,
    pub error: RawFd,
}

impl CommandSequence {
    /// A sequence wired to the process's own standard streams.
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands,
            input: STDIN_FILENO,
            output: STDOUT_FILENO,
            error: STDERR_FILENO,
        }
    }

    pub fn with_input(mut self, fd: RawFd) -> Self {
        self.input = fd;
        self
    }

    pub fn with_output(mut self, fd: RawFd) -> Self {
        self.output = fd;
        self
    }

    pub fn with_error(mut self, fd: RawFd) -> Self {
        self.error = fd;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
