//! Process orchestration: run a [`CommandSequence`] as a chain of forked
//! processes joined by pipes.
//!
//! Descriptor ownership follows one rule: every pipe end is an [`OwnedFd`]
//! held by exactly one owner at a time, so it is closed exactly once in
//! each process. Descriptors in the sequence's slots belong to the caller
//! and are never closed here.

mod child;
pub mod status;

pub use status::{NOT_EXECUTABLE, NOT_FOUND, PipelineStatus, StageStatus, Termination};

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork, pipe2};

use crate::parse::CommandSequence;

/// Reasons a pipeline could not be started or finished.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("empty pipeline")]
    EmptyPipeline,
    #[error("missing command name in pipeline stage {stage}")]
    MissingCommandName { stage: usize },
    #[error("{name}: argument contains a NUL byte")]
    NulByte { name: String },
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] Errno),
    #[error("cannot fork: {0}")]
    Fork(#[source] Errno),
    #[error("cannot wait for child: {0}")]
    Wait(#[source] Errno),
}

impl ExecError {
    /// Empty input and empty stages are ignored silently by the REPL.
    pub fn is_empty_command(&self) -> bool {
        matches!(
            self,
            ExecError::EmptyPipeline | ExecError::MissingCommandName { .. }
        )
    }
}

/// Something that can execute a parsed pipeline.
pub trait Runner {
    /// Run `seq` to completion and report how it ended.
    fn run(&mut self, seq: &CommandSequence) -> Result<PipelineStatus, ExecError>;
}

/// The real runner: fork, pipe, exec, wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkExec;

impl Runner for ForkExec {
    fn run(&mut self, seq: &CommandSequence) -> Result<PipelineStatus, ExecError> {
        run_pipeline(seq)
    }
}

/// A descriptor a stage reads from or writes to.
pub(crate) enum Endpoint {
    /// Borrowed from the sequence; never closed by us.
    Slot(RawFd),
    /// A pipe end we own; dropping it closes it.
    Pipe(OwnedFd),
}

impl AsRawFd for Endpoint {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Endpoint::Slot(fd) => *fd,
            Endpoint::Pipe(fd) => fd.as_raw_fd(),
        }
    }
}

/// Run every stage of `seq` concurrently, wired stdout-to-stdin, and wait
/// for all of them.
///
/// All stages are validated and all pipes created before the first fork,
/// so those failures start nothing. A fork failure terminates and reaps the
/// stages already started.
pub fn run_pipeline(seq: &CommandSequence) -> Result<PipelineStatus, ExecError> {
    // SAFETY: the child only moves descriptors around before exec or _exit.
    run_with(seq, |_| unsafe { fork() })
}

/// [`run_pipeline`] with the fork call for each stage supplied by the caller.
fn run_with<F>(seq: &CommandSequence, mut fork_stage: F) -> Result<PipelineStatus, ExecError>
where
    F: FnMut(usize) -> nix::Result<ForkResult>,
{
    if seq.is_empty() {
        return Err(ExecError::EmptyPipeline);
    }
    let argvs = prepare(seq)?;
    let slots = [seq.input, seq.output, seq.error];
    let mut pipes = open_pipes(argvs.len() - 1)?.into_iter();
    let mut children: Vec<Pid> = Vec::with_capacity(argvs.len());
    let mut input = Endpoint::Slot(seq.input);

    for (stage, argv) in argvs.iter().enumerate() {
        let (output, next_input) = match pipes.next() {
            Some((read, write)) => (Endpoint::Pipe(write), Some(Endpoint::Pipe(read))),
            None => (Endpoint::Slot(seq.output), None),
        };

        match fork_stage(stage) {
            Ok(ForkResult::Child) => {
                let unused = next_input.into_iter().chain(
                    pipes.flat_map(|(read, write)| [Endpoint::Pipe(read), Endpoint::Pipe(write)]),
                );
                child::exec_stage(argv, input, output, slots, unused)
            }
            Ok(ForkResult::Parent { child }) => {
                debug!("stage {stage}: forked {child} for {:?}", argv[0]);
                children.push(child);
            }
            Err(errno) => {
                warn!("fork failed at stage {stage}: {errno}");
                drop((input, output, next_input, pipes));
                abandon(&children);
                return Err(ExecError::Fork(errno));
            }
        }

        // The child has its own copy now
        drop(output);
        match next_input {
            Some(next) => input = next,
            None => break,
        }
    }
    drop(input);

    let stages = reap(&children)?;
    let status = PipelineStatus::new(stages).ok_or(ExecError::EmptyPipeline)?;
    for (stage, failed) in status.failed_upstream() {
        info!("stage {stage} (pid {}) ended with {}", failed.pid, failed.termination);
    }
    info!("pipeline of {} stage(s) ended with {}", status.stages().len(), status.termination());
    Ok(status)
}

/// Build argv vectors, rejecting empty stages and interior NULs.
fn prepare(seq: &CommandSequence) -> Result<Vec<Vec<CString>>, ExecError> {
    seq.commands
        .iter()
        .enumerate()
        .map(|(stage, command)| {
            let Some(name) = command.name() else {
                return Err(ExecError::MissingCommandName { stage });
            };
            command
                .args()
                .iter()
                .map(|arg| CString::new(arg.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ExecError::NulByte {
                    name: name.to_string(),
                })
        })
        .collect()
}

/// Create `count` close-on-exec pipes as `(read, write)` pairs.
fn open_pipes(count: usize) -> Result<Vec<(OwnedFd, OwnedFd)>, ExecError> {
    (0..count)
        .map(|_| pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe))
        .collect()
}

/// Wait for one child to terminate, retrying on EINTR.
fn wait_for(pid: Pid) -> Result<Termination, Errno> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(termination) = Termination::from_wait_status(status) {
                    return Ok(termination);
                }
            }
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(errno),
        }
    }
}

/// Reap every child in stage order. Keeps going past a failed wait so no
/// zombie is left behind, then reports the first failure.
fn reap(children: &[Pid]) -> Result<Vec<StageStatus>, ExecError> {
    let mut stages = Vec::with_capacity(children.len());
    let mut first_error = None;
    for &pid in children {
        match wait_for(pid) {
            Ok(termination) => stages.push(StageStatus { pid, termination }),
            Err(errno) => {
                warn!("waitpid({pid}) failed: {errno}");
                first_error.get_or_insert(errno);
            }
        }
    }
    match first_error {
        Some(errno) => Err(ExecError::Wait(errno)),
        None => Ok(stages),
    }
}

/// Best-effort teardown of stages started before a failure.
fn abandon(children: &[Pid]) {
    for &pid in children {
        let _ = kill(pid, Signal::SIGTERM);
    }
    for &pid in children {
        let _ = wait_for(pid);
    }
}
