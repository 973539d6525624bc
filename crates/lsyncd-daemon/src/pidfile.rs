//! PID-file writing, matching lsyncd.c's `write_pidfile`: a single
//! decimal PID followed by a newline.

use std::path::Path;

pub fn write(path: &Path, pid: u32) -> std::io::Result<()> {
    std::fs::write(path, format!("{pid}\n"))
}

/// Best-effort removal on normal shutdown. A missing or unremovable
/// pidfile at exit is not itself an error worth failing the shutdown
/// path over.
pub fn remove(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!("could not remove pidfile {}: {}", path.display(), e);
    }
}
