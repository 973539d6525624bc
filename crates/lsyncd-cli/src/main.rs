//! The `lsyncd` binary: parses the command-line surface into a
//! `DaemonConfig` and hands off to `lsyncd_daemon::run`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lsyncd_daemon::config::DaemonConfig;
use lsyncd_daemon::logging::level_for;

/// Watches a directory tree and mirrors changes to a target as they
/// happen.
#[derive(Parser, Debug)]
#[command(name = "lsyncd", version, about, long_about = None)]
struct Cli {
    /// Directory to watch.
    source_dir: PathBuf,

    /// Where changes are mirrored to (a local path or a remote
    /// locator such as `host::module`).
    target_spec: String,

    /// Include debug-level log messages.
    #[arg(long)]
    debug: bool,

    /// Log errors only.
    #[arg(long)]
    scarce: bool,

    /// Report sync outcomes without spawning the sync tool.
    #[arg(long)]
    dryrun: bool,

    /// Stay in the foreground and log to standard streams instead of
    /// detaching and writing to a log file.
    #[arg(long)]
    no_daemon: bool,

    /// Redirect logging to this file (absolute path).
    #[arg(long, value_name = "PATH")]
    logfile: Option<PathBuf>,

    /// Load directory-exclude patterns from this file (absolute path;
    /// must exist).
    #[arg(long, value_name = "PATH")]
    exclude_from: Option<PathBuf>,

    /// Absolute path to the external sync tool. Defaults to resolving
    /// `rsync` from `$PATH`.
    #[arg(long, value_name = "PATH")]
    rsync_binary: Option<PathBuf>,

    /// Write the daemon's PID to this file on startup (absolute path).
    #[arg(long, value_name = "PATH")]
    pidfile: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Exit code 4 is dedicated to missing positional arguments
            // specifically; everything else (bad flag, --help,
            // --version) uses clap's own reporting and exit code.
            if e.kind() == clap::error::ErrorKind::MissingRequiredArgument {
                eprint!("{e}");
                return ExitCode::from(lsyncd_core::error::exit_code::MISSING_ARGUMENTS as u8);
            }
            e.exit();
        }
    };

    if let Some(binary) = &cli.rsync_binary {
        if !binary.is_absolute() {
            eprintln!("lsyncd: --rsync-binary requires an absolute path, got {}", binary.display());
            return ExitCode::from(lsyncd_core::error::exit_code::FILE_NOT_FOUND as u8);
        }
    }

    let mut config = DaemonConfig::new(cli.source_dir, cli.target_spec);
    config.log_level = level_for(cli.debug, cli.scarce);
    config.dry_run = cli.dryrun;
    config.no_daemon = cli.no_daemon;
    config.logfile = cli.logfile;
    config.exclude_from = cli.exclude_from;
    config.pidfile = cli.pidfile;
    if let Some(binary) = cli.rsync_binary {
        config.rsync_binary = binary;
    }

    ExitCode::from(lsyncd_daemon::run(config) as u8)
}
