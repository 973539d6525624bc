//! Real `SyncInvoker`: spawns the external sync binary and waits for
//! it. Ground truth is lsyncd.c's `rsync()` — fork, exec, `waitpid`,
//! map the exit status.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use lsyncd_core::sync::{build_args, SyncInvoker, SyncOutcome};

/// Spawns `rsync_binary` (or whatever external tool is configured)
/// with the fixed argument shape `build_args` constructs. Child stdio
/// is redirected to the log file when daemonized; in `--no-daemon`
/// mode it inherits the process's own stdio instead.
pub struct RsyncInvoker {
    binary: PathBuf,
    exclude_from: Option<String>,
    stdio: ChildStdio,
}

/// Where the child's stdout/stderr go. Built once at startup from the
/// daemon's own log-file handle, then cloned per spawn (lsyncd.c's
/// `freopen` happens once at daemon startup; each `fork`ed child just
/// inherits the resulting fds).
pub enum ChildStdio {
    Inherit,
    LogFile(std::fs::File),
}

impl RsyncInvoker {
    pub fn new(binary: PathBuf, exclude_from: Option<&Path>, stdio: ChildStdio) -> Self {
        Self {
            binary,
            exclude_from: exclude_from.map(|p| p.display().to_string()),
            stdio,
        }
    }

    fn redirect(&self, cmd: &mut Command) {
        match &self.stdio {
            ChildStdio::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            ChildStdio::LogFile(file) => {
                let out = file.try_clone().unwrap_or_else(|_| {
                    // A failed fd duplication here only degrades logging,
                    // it must not crash an in-flight sync.
                    std::fs::File::open("/dev/null").expect("/dev/null always exists on Linux")
                });
                let err = file.try_clone().unwrap_or_else(|_| {
                    std::fs::File::open("/dev/null").expect("/dev/null always exists on Linux")
                });
                cmd.stdout(Stdio::from(out)).stderr(Stdio::from(err));
            }
        }
    }
}

impl SyncInvoker for RsyncInvoker {
    fn sync(&mut self, src_dir: &str, dst_dir: &str, recursive: bool) -> SyncOutcome {
        let args = build_args(src_dir, dst_dir, recursive, self.exclude_from.as_deref());
        tracing::debug!(?args, binary = %self.binary.display(), "invoking sync tool");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args).stdin(Stdio::null());
        self.redirect(&mut cmd);

        match cmd.status() {
            Ok(status) => {
                let code = status.code().unwrap_or(lsyncd_core::sync::CHILD_EXEC_FAILURE_STATUS);
                let outcome = SyncOutcome::from_exit_status(code);
                if outcome != SyncOutcome::Ok {
                    tracing::warn!(exit_code = code, src = src_dir, dst = dst_dir, "sync tool reported failure");
                }
                outcome
            }
            Err(e) => {
                tracing::error!("failed to exec {}: {}", self.binary.display(), e);
                SyncOutcome::Fatal
            }
        }
    }
}
