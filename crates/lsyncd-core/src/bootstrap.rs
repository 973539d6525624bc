//! Startup walk and recursive Subtree Install.
//!
//! Ground truth is lsyncd.c's `add_dirwatch`: despite taking a
//! `recursive` parameter, the original always walks every
//! subdirectory it finds — the flag is accepted but never consulted in
//! the body. This reimplementation preserves that behavior rather than
//! "fixing" it, since the dispatcher calls the very same procedure
//! from the non-recursive CREATE/MOVED_TO event path and expects it to
//! still pick up pre-existing grandchildren.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::exclude::ExcludePatterns;
use crate::path;
use crate::registry::WatchRegistry;
use crate::watcher::KernelWatcher;

/// Installs a watch on `child_path` under `parent` (and, transitively,
/// on every non-excluded subdirectory of it), naming it `child_name` in
/// the registry. On success returns the new node's index; on a
/// per-subtree failure (watch install or directory open), logs and
/// returns `None` without propagating — a failed subtree is simply
/// skipped, it does not abort the caller.
#[allow(clippy::too_many_arguments)]
pub fn subtree_install<W: KernelWatcher>(
    registry: &mut WatchRegistry,
    watcher: &mut W,
    exclude: &ExcludePatterns,
    root_prefix: &str,
    parent: usize,
    child_name: &str,
    dest_name: Option<String>,
    terminating: &AtomicBool,
) -> Option<usize> {
    if exclude.matches(child_name) {
        return None;
    }

    let child_path = match path::source_path(registry, root_prefix, parent) {
        Ok(parent_path) => PathBuf::from(format!("{parent_path}{child_name}")),
        Err(e) => {
            tracing::error!("cannot build path for new watch: {}", e);
            return None;
        }
    };

    let descriptor = match watcher.add(&child_path) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("cannot add watch {}: {}", child_path.display(), e);
            return None;
        }
    };

    let index = match registry.insert(parent, child_name, dest_name, descriptor) {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("cannot register watch {}: {}", child_path.display(), e);
            watcher.remove(descriptor);
            return None;
        }
    };

    walk_and_install_children(registry, watcher, exclude, root_prefix, index, &child_path, terminating);

    Some(index)
}

fn walk_and_install_children<W: KernelWatcher>(
    registry: &mut WatchRegistry,
    watcher: &mut W,
    exclude: &ExcludePatterns,
    root_prefix: &str,
    node: usize,
    dir_path: &Path,
    terminating: &AtomicBool,
) {
    let entries = match std::fs::read_dir(dir_path) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("cannot open dir {}: {}", dir_path.display(), e);
            return;
        }
    };

    for entry in entries {
        if terminating.load(Ordering::SeqCst) {
            break;
        }
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        subtree_install(
            registry, watcher, exclude, root_prefix, node, name, None, terminating,
        );
    }
}

/// One-time startup procedure: walk the source tree, installing
/// watches on the root and every non-excluded subdirectory.
/// Returns the root node's index. The initial recursive sync itself is
/// the caller's responsibility (it needs the `SyncInvoker`, which this
/// module deliberately does not depend on).
pub fn bootstrap<W: KernelWatcher>(
    registry: &mut WatchRegistry,
    watcher: &mut W,
    exclude: &ExcludePatterns,
    source_root: &Path,
    terminating: &AtomicBool,
) -> crate::error::Result<usize> {
    let descriptor = watcher.add(source_root)?;
    let root = registry.insert(
        crate::registry::NO_PARENT,
        String::new(),
        Some(String::new()),
        descriptor,
    )?;

    let prefix = root_prefix(source_root);
    walk_and_install_children(registry, watcher, exclude, &prefix, root, source_root, terminating);

    Ok(root)
}

/// The absolute, trailing-slash-normalized prefix the Path Builder uses
/// as the root's `source_path`/`dest_path` starting string. Exposed so
/// callers that need to build paths against the same tree after
/// `bootstrap` returns (the daemon's initial recursive sync, the event
/// dispatcher) compute an identical prefix rather than re-deriving it.
pub fn root_prefix(source_root: &Path) -> String {
    format!("{}/", source_root.display().to_string().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::fake::FakeWatcher;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn bootstrap_installs_root_and_nested_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("a").join("b")).unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();
        std::fs::write(dir.path().join("a").join("file.txt"), b"hi").unwrap();

        let mut registry = WatchRegistry::new();
        let mut watcher = FakeWatcher::new();
        let exclude = ExcludePatterns::empty();
        let terminating = AtomicBool::new(false);

        let root = bootstrap(&mut registry, &mut watcher, &exclude, dir.path(), &terminating).unwrap();

        assert_eq!(registry.len_live(), 4, "root + a + a/b + c");
        assert_eq!(watcher.added.len(), 4);
        assert!(registry.get(root).is_some());
    }

    #[test]
    fn excluded_subdirectory_is_not_watched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();

        let mut registry = WatchRegistry::new();
        let mut watcher = FakeWatcher::new();
        let exclude = ExcludePatterns::from_lines(["node_modules/"]).unwrap();
        let terminating = AtomicBool::new(false);

        bootstrap(&mut registry, &mut watcher, &exclude, dir.path(), &terminating).unwrap();

        assert_eq!(registry.len_live(), 2, "root + src only");
    }

    #[test]
    fn watch_install_failure_skips_only_that_subtree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ok")).unwrap();
        std::fs::create_dir(dir.path().join("bad")).unwrap();

        let mut registry = WatchRegistry::new();
        let mut watcher = FakeWatcher::new();
        watcher.fail_add_for.push(dir.path().join("bad"));
        let exclude = ExcludePatterns::empty();
        let terminating = AtomicBool::new(false);

        bootstrap(&mut registry, &mut watcher, &exclude, dir.path(), &terminating).unwrap();

        assert_eq!(registry.len_live(), 2, "root + ok; bad skipped");
    }
}
