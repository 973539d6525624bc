//! Pure path reconstruction from the watch tree.
//!
//! Ground truth is lsyncd.c's `buildpath`: walk the parent chain
//! root-to-leaf, picking `dest_name` over `name` on the destination
//! side, joining with `/`.

use crate::error::{CoreError, Result};
use crate::registry::{WatchRegistry, NO_PARENT};

/// Platform path length limit `buildpath` guarded against with `PATH_MAX`.
/// 4096 matches Linux's `PATH_MAX` (`limits.h`), the only platform this
/// daemon targets.
pub const PATH_MAX: usize = 4096;

/// Collects the chain of ancestor indices from the root down to (and
/// including) `node`.
fn ancestor_chain(registry: &WatchRegistry, node: usize) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut current = Some(node);
    while let Some(index) = current {
        chain.push(index);
        let Some(n) = registry.get(index) else {
            break;
        };
        current = if n.parent == NO_PARENT {
            None
        } else {
            Some(n.parent)
        };
    }
    chain.reverse();
    chain
}

/// Reconstructs the absolute source-side path of a live node by
/// concatenating each ancestor's `name`, root-to-leaf. Empty segments
/// (the root's placeholder name) are skipped rather than producing a
/// double slash.
pub fn source_path(registry: &WatchRegistry, root_prefix: &str, node: usize) -> Result<String> {
    build_path(registry, node, root_prefix, false)
}

/// Reconstructs the destination-side path, substituting each node's
/// `dest_name` for `name` when present, and prepending `dest_root`.
pub fn dest_path(registry: &WatchRegistry, dest_root: &str, node: usize) -> Result<String> {
    build_path(registry, node, dest_root, true)
}

fn build_path(
    registry: &WatchRegistry,
    node: usize,
    prefix: &str,
    use_dest_name: bool,
) -> Result<String> {
    let mut out = String::from(prefix);

    for index in ancestor_chain(registry, node) {
        let Some(n) = registry.get(index) else {
            continue;
        };
        let segment: &str = if use_dest_name {
            n.dest_name.as_deref().unwrap_or(&n.name)
        } else {
            n.name.as_str()
        };
        if segment.is_empty() {
            continue;
        }
        if out.len() + segment.len() + 2 > PATH_MAX {
            return Err(CoreError::PathTooLong(out.clone().into()));
        }
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }

    if !out.ends_with('/') {
        if out.len() + 1 > PATH_MAX {
            return Err(CoreError::PathTooLong(out.clone().into()));
        }
        out.push('/');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{WatchRegistry, NO_PARENT};

    fn build_tree() -> (WatchRegistry, usize, usize, usize) {
        let mut reg = WatchRegistry::new();
        let root = reg.insert(NO_PARENT, "", Some(String::new()), 1).unwrap();
        let a = reg.insert(root, "a", None, 2).unwrap();
        let b = reg.insert(a, "b", None, 3).unwrap();
        (reg, root, a, b)
    }

    #[test]
    fn source_path_joins_ancestor_names() {
        let (reg, root, a, b) = build_tree();
        assert_eq!(source_path(&reg, "/tmp/src/", root).unwrap(), "/tmp/src/");
        assert_eq!(source_path(&reg, "/tmp/src/", a).unwrap(), "/tmp/src/a/");
        assert_eq!(source_path(&reg, "/tmp/src/", b).unwrap(), "/tmp/src/a/b/");
    }

    #[test]
    fn dest_path_uses_override_when_present() {
        let mut reg = WatchRegistry::new();
        let root = reg
            .insert(NO_PARENT, "", Some(String::new()), 1)
            .unwrap();
        let a = reg
            .insert(root, "a", Some("renamed".to_string()), 2)
            .unwrap();

        assert_eq!(dest_path(&reg, "host::module/", root).unwrap(), "host::module/");
        assert_eq!(
            dest_path(&reg, "host::module/", a).unwrap(),
            "host::module/renamed/"
        );
    }

    #[test]
    fn rejects_paths_exceeding_platform_limit() {
        let mut reg = WatchRegistry::new();
        let root = reg.insert(NO_PARENT, "", None, 1).unwrap();
        let long_name = "x".repeat(PATH_MAX);
        let child = reg.insert(root, long_name, None, 2).unwrap();
        assert!(matches!(
            source_path(&reg, "/tmp/", child),
            Err(CoreError::PathTooLong(_))
        ));
    }
}
