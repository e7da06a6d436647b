use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};

use nix::fcntl::OFlag;
use nix::sys::signal::Signal;
use nix::unistd::pipe2;
use pipesh::exec::{ExecError, NOT_FOUND, PipelineStatus, Termination, run_pipeline};
use pipesh::parse::{Command, CommandSequence};

struct Outcome {
    result: Result<PipelineStatus, ExecError>,
    stdout: String,
    stderr: String,
}

fn pipe() -> (OwnedFd, OwnedFd) {
    pipe2(OFlag::O_CLOEXEC).unwrap()
}

fn drain(fd: OwnedFd) -> String {
    let mut text = String::new();
    File::from(fd).read_to_string(&mut text).unwrap();
    text
}

/// Run `seq` with its output and error slots captured, optionally feeding
/// `input` through its input slot.
fn run_seq(seq: CommandSequence, input: Option<&str>) -> Outcome {
    let (out_r, out_w) = pipe();
    let (err_r, err_w) = pipe();
    let mut seq = seq
        .with_output(out_w.as_raw_fd())
        .with_error(err_w.as_raw_fd());

    let in_r = input.map(|text| {
        let (r, w) = pipe();
        File::from(w).write_all(text.as_bytes()).unwrap();
        r
    });
    if let Some(r) = &in_r {
        seq = seq.with_input(r.as_raw_fd());
    }

    let result = run_pipeline(&seq);
    drop((out_w, err_w, in_r));
    Outcome {
        result,
        stdout: drain(out_r),
        stderr: drain(err_r),
    }
}

fn run_line(line: &str) -> Outcome {
    let seq = pipesh::parse_line(line).unwrap_or_else(|| panic!("line did not parse: {line:?}"));
    run_seq(seq, None)
}

fn manual(stages: &[&[&str]]) -> CommandSequence {
    CommandSequence::new(
        stages
            .iter()
            .map(|s| Command::new(s.iter().map(|a| a.to_string()).collect()))
            .collect(),
    )
}

#[test]
fn echo_hi() {
    let out = run_line("echo hi");
    let status = out.result.unwrap();
    assert!(status.success());
    assert_eq!(status.stages().len(), 1);
    assert_eq!(out.stdout, "hi\n");
    assert!(out.stderr.is_empty());
}

#[test]
fn arguments_passed_verbatim() {
    let out = run_line("printf '%s,' a 'b c' \"d  e\"");
    assert!(out.result.unwrap().success());
    assert_eq!(out.stdout, "a,b c,d  e,");
}

#[test]
fn two_stages_connected() {
    let out = run_line("printf 'a\\nb\\nc\\n' | wc -l");
    let status = out.result.unwrap();
    assert_eq!(status.stages().len(), 2);
    assert!(status.success());
    assert_eq!(out.stdout.trim(), "3");
}

#[test]
fn tight_pipe_connected() {
    let out = run_line("echo hello|tr a-z A-Z");
    assert_eq!(out.stdout, "HELLO\n");
}

#[test]
fn three_stages_connected() {
    let out = run_line("echo hello | tr a-z A-Z | cat");
    let status = out.result.unwrap();
    assert_eq!(status.stages().len(), 3);
    assert_eq!(out.stdout, "HELLO\n");
}

#[test]
fn many_stages_connected() {
    let out = run_line("echo x | cat | cat | cat | cat | cat | cat | cat");
    assert_eq!(out.result.unwrap().stages().len(), 8);
    assert_eq!(out.stdout, "x\n");
}

#[test]
fn input_slot_feeds_first_stage() {
    let seq = pipesh::parse_line("wc -l").unwrap();
    let out = run_seq(seq, Some("x\ny\n"));
    assert_eq!(out.stdout.trim(), "2");
}

#[test]
fn input_slot_only_reaches_first_stage() {
    let seq = pipesh::parse_line("cat | tr a-z A-Z").unwrap();
    let out = run_seq(seq, Some("abc\n"));
    assert_eq!(out.stdout, "ABC\n");
}

#[test]
fn final_stage_status_reported() {
    let out = run_line("true | sh -c 'exit 3'");
    let status = out.result.unwrap();
    assert_eq!(status.code(), 3);
    assert_eq!(status.termination(), Termination::Exited(3));
}

#[test]
fn upstream_failure_does_not_change_status() {
    let status = run_line("false | true").result.unwrap();
    assert!(status.success());
    assert_eq!(status.stages()[0].termination, Termination::Exited(1));
    assert_eq!(status.failed_upstream().count(), 1);
}

#[test]
fn every_stage_is_reaped() {
    let status = run_line("sh -c 'exit 4' | sh -c 'exit 5' | true").result.unwrap();
    let codes: Vec<i32> = status.stages().iter().map(|s| s.termination.code()).collect();
    assert_eq!(codes, vec![4, 5, 0]);
    let pids: std::collections::HashSet<_> = status.stages().iter().map(|s| s.pid).collect();
    assert_eq!(pids.len(), 3);
}

#[test]
fn command_not_found() {
    let out = run_line("pipesh-definitely-not-a-program --flag");
    let status = out.result.unwrap();
    assert_eq!(status.code(), NOT_FOUND);
    assert!(
        out.stderr
            .contains("pipesh-definitely-not-a-program: command not found"),
        "stderr: {}",
        out.stderr
    );
}

#[test]
fn command_not_found_mid_pipeline() {
    let out = run_line("echo hi | pipesh-no-such-filter | cat");
    let status = out.result.unwrap();
    assert!(status.success());
    assert_eq!(status.stages()[1].termination.code(), NOT_FOUND);
    assert!(out.stdout.is_empty());
}

#[test]
fn signal_death_reported() {
    let seq = manual(&[&["sh", "-c", "kill -TERM $$"]]);
    let status = run_seq(seq, None).result.unwrap();
    assert_eq!(status.termination(), Termination::Signaled(Signal::SIGTERM));
    assert_eq!(status.code(), 128 + Signal::SIGTERM as i32);
}

#[test]
fn trailing_pipe_is_empty_command() {
    let out = run_line("echo hi |");
    let err = out.result.unwrap_err();
    assert!(matches!(err, ExecError::MissingCommandName { stage: 1 }));
    // Nothing ran
    assert!(out.stdout.is_empty());
}

#[test]
fn unmatched_glob_is_empty_command() {
    let out = run_line("*.nonexistent_ext");
    assert!(out.result.unwrap_err().is_empty_command());
}

#[cfg(target_os = "linux")]
#[test]
fn argv0_is_the_bare_name() {
    let out = run_line("cat /proc/self/cmdline");
    assert_eq!(out.stdout, "cat\0/proc/self/cmdline\0");
}

#[cfg(target_os = "linux")]
#[test]
fn stages_see_only_standard_streams() {
    // fd 3 is ls's own handle on the directory it lists
    let listing = "ls /proc/self/fd | tr '\\n' ' '";
    let seq = manual(&[&["echo", "x"], &["sh", "-c", listing], &["cat"], &["cat"]]);
    let out = run_seq(seq, None);
    assert!(out.result.unwrap().success());
    assert_eq!(out.stdout, "0 1 2 3 ");
}

#[test]
fn hash_word_passed_as_argument() {
    let out = run_line("echo a #b");
    assert_eq!(out.stdout, "a #b\n");
}
