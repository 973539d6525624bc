//! POSIX daemonization, replacing lsyncd.c's single `daemon(0, 0)` call
//! with the `nix` crate's direct wrappers over `fork`/`setsid`/`chdir`.

use std::os::fd::AsRawFd;

use nix::unistd::{self, ForkResult};

/// Detaches the current process from its controlling terminal: forks
/// once (the original process exits immediately so the shell that
/// launched us doesn't block), starts a new session, changes directory
/// to `/`, and redirects stdin/stdout/stderr to `/dev/null`.
///
/// Must be called before any threads are spawned and before the log
/// file is opened in append mode — both of which happen after this
/// returns, in the daemon's startup sequence.
pub fn daemonize() -> nix::Result<()> {
    // SAFETY: called at startup, before any other threads exist and
    // before any file descriptors we care about preserving are opened.
    match unsafe { unistd::fork()? } {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    unistd::setsid()?;
    unistd::chdir("/")?;

    let dev_null = std::fs::OpenOptions::new().read(true).write(true).open("/dev/null")?;
    let fd = dev_null.as_raw_fd();
    unistd::dup2(fd, std::io::stdin().as_raw_fd())?;
    unistd::dup2(fd, std::io::stdout().as_raw_fd())?;
    unistd::dup2(fd, std::io::stderr().as_raw_fd())?;

    Ok(())
}
