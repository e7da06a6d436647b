//! Exit statuses of reaped pipeline stages.

use std::fmt;

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// Exit status used by a stage whose program could not be found.
pub const NOT_FOUND: i32 = 127;
/// Exit status used by a stage whose program was found but could not run.
pub const NOT_EXECUTABLE: i32 = 126;

/// How a stage's process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(Signal),
}

impl Termination {
    /// Decode a final wait status. Stops and continues are not final.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Termination::Signaled(signal)),
            _ => None,
        }
    }

    /// Numeric status; a signal death maps to `128 + signo`.
    pub fn code(self) -> i32 {
        match self {
            Termination::Exited(code) => code,
            Termination::Signaled(signal) => 128 + signal as i32,
        }
    }

    pub fn success(self) -> bool {
        self == Termination::Exited(0)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit status {code}"),
            Termination::Signaled(signal) => write!(f, "terminated by {}", signal.as_str()),
        }
    }
}

/// One reaped stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStatus {
    pub pid: Pid,
    pub termination: Termination,
}

/// Every stage of a finished pipeline, in stage order.
///
/// The pipeline as a whole reports its final stage's status; earlier
/// stages are kept so callers can inspect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    stages: Vec<StageStatus>,
    last: Termination,
}

impl PipelineStatus {
    /// Returns `None` for an empty stage list.
    pub fn new(stages: Vec<StageStatus>) -> Option<Self> {
        let last = stages.last()?.termination;
        Some(Self { stages, last })
    }

    pub fn stages(&self) -> &[StageStatus] {
        &self.stages
    }

    /// The final stage's termination, which stands for the whole pipeline.
    pub fn termination(&self) -> Termination {
        self.last
    }

    pub fn code(&self) -> i32 {
        self.last.code()
    }

    pub fn success(&self) -> bool {
        self.last.success()
    }

    /// Stages other than the last that did not exit successfully.
    pub fn failed_upstream(&self) -> impl Iterator<Item = (usize, &StageStatus)> {
        let upstream = self.stages.len().saturating_sub(1);
        self.stages[..upstream]
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.termination.success())
    }
}
