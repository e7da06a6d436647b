//! Child side of a fork: wire descriptors, then replace the program image.
//!
//! Nothing here returns. Exits go through `_exit` so the child never runs
//! the parent's destructors or flushes buffers it inherited. Diagnostics
//! are written straight to descriptor 2; std's stderr handle is not used
//! after the fork.

use std::ffi::CString;
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::libc::{self, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{dup2, execvp};

use super::Endpoint;
use super::status::{NOT_EXECUTABLE, NOT_FOUND};

/// Become one pipeline stage.
///
/// `unused` holds every pipe end this stage has no business with; they are
/// closed before anything else happens. `slots` are the caller's input,
/// output and error descriptors: once this stage's own streams are in
/// place they are marked close-on-exec so the program never inherits them.
pub(super) fn exec_stage(
    argv: &[CString],
    input: Endpoint,
    output: Endpoint,
    slots: [RawFd; 3],
    unused: impl IntoIterator<Item = Endpoint>,
) -> ! {
    unused.into_iter().for_each(drop);

    let name = argv[0].to_string_lossy().into_owned();
    let error = slots[2];
    if let Err(errno) = install(input, STDIN_FILENO)
        .and_then(|()| install(output, STDOUT_FILENO))
        .and_then(|()| install(Endpoint::Slot(error), STDERR_FILENO))
    {
        report(&format!("{name}: cannot set up descriptors: {errno}\n"));
        exit(NOT_EXECUTABLE);
    }
    for fd in slots {
        if fd > STDERR_FILENO {
            let _ = fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC));
        }
    }

    let errno = match execvp(argv[0].as_c_str(), argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    if errno == Errno::ENOENT {
        report(&format!("{name}: command not found\n"));
        exit(NOT_FOUND);
    }
    report(&format!("{name}: {errno}\n"));
    exit(NOT_EXECUTABLE)
}

/// Make `end` the descriptor at `target`, closing the original.
fn install(end: Endpoint, target: RawFd) -> Result<(), Errno> {
    let fd = end.as_raw_fd();
    if fd == target {
        // Already in place: keep it open across exec
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
        if let Endpoint::Pipe(owned) = end {
            let _ = owned.into_raw_fd();
        }
        return Ok(());
    }
    dup2(fd, target)?;
    // Dropping a pipe end closes the pre-dup descriptor
    drop(end);
    Ok(())
}

/// Write `message` to descriptor 2, best effort.
fn report(message: &str) {
    let mut bytes = message.as_bytes();
    while !bytes.is_empty() {
        // SAFETY: the pointer and length describe a live byte slice.
        let n = unsafe { libc::write(STDERR_FILENO, bytes.as_ptr().cast(), bytes.len()) };
        if n <= 0 {
            if n < 0 && Errno::last() == Errno::EINTR {
                continue;
            }
            return;
        }
        bytes = &bytes[n as usize..];
    }
}

fn exit(code: i32) -> ! {
    // SAFETY: terminates the forked child without running the parent's
    // atexit handlers or destructors.
    unsafe { libc::_exit(code) }
}
