//! Ambient process glue around `lsyncd-core`: real inotify/process
//! adapters, daemonization, logging, and the top-level run loop that
//! wires them all together, mirroring lsyncd.c's `main()`.

pub mod config;
pub mod daemonize;
pub mod inotify_watcher;
pub mod logging;
pub mod pidfile;
pub mod rsync_invoker;
pub mod termination;

use std::fs::OpenOptions;

use anyhow::Context;

use lsyncd_core::error::exit_code;
use lsyncd_core::sync::{DryRunInvoker, SyncInvoker, SyncOutcome};
use lsyncd_core::{bootstrap, ExcludePatterns};

use config::DaemonConfig;
use inotify_watcher::InotifyWatcher;
use rsync_invoker::{ChildStdio, RsyncInvoker};

/// Runs the daemon to completion (or until a fatal condition) and
/// returns the process exit code, the only thing `lsyncd-cli`'s `main`
/// needs to turn into `std::process::exit`.
///
/// Most of the ambient setup below (opening the log file, forking,
/// writing the pidfile, initializing inotify) can only fail with a
/// generic OS-resource error, so it is threaded through `anyhow` with
/// `.context(...)` rather than hand-matched at each call site; the few
/// conditions that get a *specific* exit code (sync failure, too many
/// excludes) are matched explicitly instead of flowing through the
/// generic fallback.
pub fn run(config: DaemonConfig) -> i32 {
    match try_run(&config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            exit_code::FILE_NOT_FOUND
        }
    }
}

fn try_run(config: &DaemonConfig) -> anyhow::Result<i32> {
    validate_paths(config).map_err(anyhow::Error::msg)?;

    logging::init(config).context("cannot set up logging")?;

    // Resolved once, before daemonize() chdir()s to "/": a relative
    // SOURCE_DIR must be anchored to the caller's cwd, not the root
    // directory the daemonized process ends up in. lsyncd.c resolves
    // this with realdir() ahead of its own daemon(0, 0) call.
    let source_dir = config
        .source_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve source directory {}", config.source_dir.display()))?;

    if !config.no_daemon {
        daemonize::daemonize().context("failed to daemonize")?;
    }

    if let Some(pidfile_path) = &config.pidfile {
        pidfile::write(pidfile_path, std::process::id())
            .with_context(|| format!("cannot write pidfile {}", pidfile_path.display()))?;
    }

    let terminating = termination::install().context("cannot install signal handlers")?;

    let exclude = match &config.exclude_from {
        Some(path) => match ExcludePatterns::load(path) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!("cannot load exclude file {}: {}", path.display(), e);
                return Ok(e.exit_code());
            }
        },
        None => ExcludePatterns::empty(),
    };

    let mut registry = lsyncd_core::WatchRegistry::new();
    let mut watcher = InotifyWatcher::new().context("cannot initialize inotify")?;

    if let Err(e) = bootstrap::bootstrap(
        &mut registry,
        &mut watcher,
        &exclude,
        &source_dir,
        &terminating,
    ) {
        tracing::error!("startup walk failed: {}", e);
        return Ok(e.exit_code());
    }

    let root_prefix = bootstrap::root_prefix(&source_dir);
    let dest_root = config.target_spec.clone();

    let mut dry_run_invoker;
    let mut real_invoker;
    let invoker: &mut dyn SyncInvoker = if config.dry_run {
        dry_run_invoker = DryRunInvoker;
        &mut dry_run_invoker
    } else {
        real_invoker = RsyncInvoker::new(
            config.rsync_binary.clone(),
            config.exclude_from.as_deref(),
            child_stdio(config),
        );
        &mut real_invoker
    };

    tracing::info!(source = %source_dir.display(), target = %dest_root, "performing initial recursive sync");
    match invoker.sync(&root_prefix, &dest_root, true) {
        SyncOutcome::Ok => {}
        SyncOutcome::Transient | SyncOutcome::Fatal => {
            tracing::error!("initial recursive sync failed");
            return Ok(exit_code::SYNC_FAILURE);
        }
    }

    let mut dispatcher = lsyncd_core::EventDispatcher {
        registry: &mut registry,
        watcher: &mut watcher,
        invoker,
        exclude: &exclude,
        root_prefix,
        dest_root,
        terminating: &terminating,
    };

    let result = dispatcher.run();

    if let Some(pidfile_path) = &config.pidfile {
        pidfile::remove(pidfile_path);
    }

    Ok(match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("dispatcher exited: {}", e);
            e.exit_code()
        }
    })
}

fn child_stdio(config: &DaemonConfig) -> ChildStdio {
    if config.no_daemon {
        return ChildStdio::Inherit;
    }
    match &config.logfile {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => ChildStdio::LogFile(file),
            Err(e) => {
                tracing::warn!("cannot open log file for child stdio, inheriting instead: {}", e);
                ChildStdio::Inherit
            }
        },
        None => ChildStdio::Inherit,
    }
}

/// `logfile`/`exclude-from`/`pidfile` must be absolute paths when
/// given; checked once, up front, before anything else touches the
/// filesystem. `rsync-binary`'s absoluteness (also required, but only
/// when the flag is actually passed) is validated at the CLI boundary
/// instead, since `DaemonConfig` cannot tell a user-supplied value
/// from the bare `"rsync"` default.
fn validate_paths(config: &DaemonConfig) -> Result<(), String> {
    let checks: [(&str, Option<&std::path::Path>); 3] = [
        ("logfile", config.logfile.as_deref()),
        ("exclude-from", config.exclude_from.as_deref()),
        ("pidfile", config.pidfile.as_deref()),
    ];
    for (flag, path) in checks {
        if let Some(p) = path {
            if !p.is_absolute() {
                return Err(format!("--{flag} requires an absolute path, got {}", p.display()));
            }
        }
    }
    Ok(())
}
