//! The one piece of process-global mutable state this daemon allows: a
//! termination flag safe to write from a signal handler. Grounded on
//! lsyncd.c's `catch_alarm`/`keep_going`, reimplemented with
//! `signal-hook`'s async-signal-safe flag registration instead of a
//! hand-rolled handler.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

/// Registers `SIGTERM` and `SIGINT` to set the returned flag. No other
/// work happens in the handler.
pub fn install() -> std::io::Result<Arc<AtomicBool>> {
    let terminating = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&terminating))?;
    flag::register(SIGINT, Arc::clone(&terminating))?;
    Ok(terminating)
}
