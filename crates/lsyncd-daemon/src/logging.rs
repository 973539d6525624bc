//! `tracing_subscriber::fmt()` setup, picking its writer (log file vs.
//! stderr) and level from a `DaemonConfig` instead of an env var,
//! following the `logfile`/`no-daemon` CLI flags.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::DaemonConfig;

/// Installs the global subscriber. Must be called once, before
/// `daemonize()`, so a misconfigured log path is reported to the
/// still-attached terminal rather than silently swallowed after the
/// fork.
pub fn init(config: &DaemonConfig) -> std::io::Result<()> {
    let writer = make_writer(config)?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(writer)
        .with_target(false)
        .with_ansi(config.no_daemon)
        .init();

    Ok(())
}

fn make_writer(config: &DaemonConfig) -> std::io::Result<BoxMakeWriter> {
    if config.no_daemon || config.logfile.is_none() {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    }

    let path = config.logfile.as_deref().expect("checked above");
    let file = open_append(path)?;
    Ok(BoxMakeWriter::new(move || file.try_clone().expect("log file fd duplication")))
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Maps the `--debug`/`--scarce` CLI flags onto `tracing` levels, the
/// same `DEBUG`/`INFO`/`ERROR` split lsyncd.c's `LOG_DEBUG`/
/// `LOG_NORMAL`/`LOG_ERROR` made.
pub fn level_for(debug: bool, scarce: bool) -> Level {
    match (debug, scarce) {
        (true, _) => Level::DEBUG,
        (false, true) => Level::ERROR,
        (false, false) => Level::INFO,
    }
}
