//! Daemon-wide configuration: one plain struct built once by the CLI
//! layer and threaded through to the dispatcher, rather than read back
//! out of process-global state.

use std::path::PathBuf;

use tracing::Level;

/// Everything `lsyncd_daemon::run` needs to start. Constructed once by
/// `lsyncd-cli` from the parsed command line and never mutated.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub source_dir: PathBuf,
    pub target_spec: String,
    pub log_level: Level,
    pub dry_run: bool,
    pub no_daemon: bool,
    pub rsync_binary: PathBuf,
    pub exclude_from: Option<PathBuf>,
    pub pidfile: Option<PathBuf>,
    pub logfile: Option<PathBuf>,
}

impl DaemonConfig {
    /// Defaults matching lsyncd.c's own: normal log level, no dry-run,
    /// daemonize, `rsync` resolved from `$PATH`.
    pub fn new(source_dir: PathBuf, target_spec: String) -> Self {
        Self {
            source_dir,
            target_spec,
            log_level: Level::INFO,
            dry_run: false,
            no_daemon: false,
            rsync_binary: PathBuf::from("rsync"),
            exclude_from: None,
            pidfile: None,
            logfile: None,
        }
    }
}
