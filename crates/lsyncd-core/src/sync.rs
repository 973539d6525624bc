//! The sync invoker's contract: a single `sync` operation with a fixed
//! argument shape, and an exit-status mapping. Ground truth is
//! lsyncd.c's `rsync()`.

/// Outcome of one invocation of the external sync tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Ok,
    Transient,
    Fatal,
}

/// Reserved child exit status meaning "failed to exec the binary"
/// (lsyncd.c's `LSYNCD_INTERNALFAIL`).
pub const CHILD_EXEC_FAILURE_STATUS: i32 = 255;

impl SyncOutcome {
    /// Maps a child process exit status to an outcome: zero -> ok, the
    /// reserved sentinel -> fatal, anything else non-zero -> transient.
    pub fn from_exit_status(status: i32) -> Self {
        match status {
            0 => SyncOutcome::Ok,
            CHILD_EXEC_FAILURE_STATUS => SyncOutcome::Fatal,
            _ => SyncOutcome::Transient,
        }
    }
}

/// Builds the fixed, positional argument vector the external sync tool
/// is called with. Kept pure and separate from actually spawning the
/// process so the shape is unit-testable without a real binary.
pub fn build_args(
    src_dir: &str,
    dst_dir: &str,
    recursive: bool,
    exclude_from: Option<&str>,
) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    args.push("--delete".to_string());
    args.push(if recursive { "-ltr" } else { "-ltd" }.to_string());
    if let Some(exclude_from) = exclude_from {
        args.push("--exclude-from".to_string());
        args.push(exclude_from.to_string());
    }
    args.push(src_dir.to_string());
    args.push(dst_dir.to_string());
    args
}

/// The operation the dispatcher needs from the sync invoker. The real
/// implementation (spawn + wait on the external binary) lives in
/// `lsyncd-daemon`.
pub trait SyncInvoker {
    fn sync(&mut self, src_dir: &str, dst_dir: &str, recursive: bool) -> SyncOutcome;
}

/// A `SyncInvoker` that never spawns anything and always reports `Ok`,
/// for `--dryrun` and for tests that don't care about sync outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInvoker;

impl SyncInvoker for DryRunInvoker {
    fn sync(&mut self, _src_dir: &str, _dst_dir: &str, _recursive: bool) -> SyncOutcome {
        SyncOutcome::Ok
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursive_flag_picks_ltr_else_ltd() {
        assert_eq!(
            build_args("/src/", "/dst/", true, None),
            vec!["--delete", "-ltr", "/src/", "/dst/"]
        );
        assert_eq!(
            build_args("/src/", "/dst/", false, None),
            vec!["--delete", "-ltd", "/src/", "/dst/"]
        );
    }

    #[test]
    fn exclude_from_is_inserted_only_when_present() {
        let args = build_args("/src/", "/dst/", false, Some("/excl"));
        assert_eq!(
            args,
            vec!["--delete", "-ltd", "--exclude-from", "/excl", "/src/", "/dst/"]
        );
    }

    #[test]
    fn exit_status_mapping() {
        assert_eq!(SyncOutcome::from_exit_status(0), SyncOutcome::Ok);
        assert_eq!(SyncOutcome::from_exit_status(255), SyncOutcome::Fatal);
        assert_eq!(SyncOutcome::from_exit_status(23), SyncOutcome::Transient);
        assert_eq!(SyncOutcome::from_exit_status(1), SyncOutcome::Transient);
    }
}
