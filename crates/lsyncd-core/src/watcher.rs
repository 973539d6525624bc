//! The `KernelWatcher` capability the dispatcher needs: add a watch,
//! remove a watch, read a batch of events. The real
//! implementation (Linux inotify) lives in `lsyncd-daemon`; this trait
//! and the in-memory `Event`/`EventMask` types let the dispatcher be
//! driven and unit-tested without touching the kernel.

use std::path::Path;

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Event kinds a watch was told to report, shaped after inotify's
    /// own mask bits (`IN_*` constants) but kept independent of any
    /// particular FFI crate so the core has no OS dependency.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const ATTRIB      = 1 << 0;
        const CLOSE_WRITE  = 1 << 1;
        const CREATE       = 1 << 2;
        const DELETE       = 1 << 3;
        const DELETE_SELF  = 1 << 4;
        const MOVED_FROM   = 1 << 5;
        const MOVED_TO     = 1 << 6;
        const ISDIR        = 1 << 7;
        const IGNORED      = 1 << 8;
    }
}

impl EventMask {
    /// The mask `add_watch` installs on every directory: attribute-
    /// change, close-after-write, create, delete, delete-of-watched-
    /// dir, move-from, move-to.
    pub fn watch_mask() -> Self {
        Self::ATTRIB
            | Self::CLOSE_WRITE
            | Self::CREATE
            | Self::DELETE
            | Self::DELETE_SELF
            | Self::MOVED_FROM
            | Self::MOVED_TO
    }

    /// The subset of masks that should trigger a non-recursive sync of
    /// the directory the event occurred in.
    pub fn triggers_sync(self) -> bool {
        self.intersects(
            Self::CREATE | Self::CLOSE_WRITE | Self::DELETE | Self::MOVED_TO | Self::MOVED_FROM,
        )
    }
}

/// A single kernel-delivered event.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Which watch this event is about.
    pub descriptor: i32,
    /// Which kinds occurred.
    pub mask: EventMask,
    /// The affected child's basename; empty when the event concerns
    /// the watched directory itself.
    pub name: String,
}

impl RawEvent {
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }

    pub fn is_ignored(&self) -> bool {
        self.mask.contains(EventMask::IGNORED)
    }
}

/// Abstract capability set the event dispatcher needs from the kernel's
/// filesystem-notification facility.
pub trait KernelWatcher {
    /// Installs a watch on an existing directory with the fixed mask
    /// from [`EventMask::watch_mask`]. Returns the kernel-assigned
    /// descriptor.
    fn add(&mut self, path: &Path) -> Result<i32>;

    /// Removes a watch. Idempotent from the caller's perspective: the
    /// kernel may already have auto-removed it, and that is not an
    /// error here.
    fn remove(&mut self, descriptor: i32);

    /// Blocks until at least one event is available, then returns the
    /// whole batch the kernel handed back in one read.
    fn read_batch(&mut self) -> Result<Vec<RawEvent>>;
}

#[cfg(test)]
pub mod fake {
    //! An in-memory `KernelWatcher` used by dispatcher/bootstrapper
    //! tests, playing the role lsyncd.c's real inotify fd plays, minus
    //! the kernel.

    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeWatcher {
        next_descriptor: i32,
        pub added: Vec<std::path::PathBuf>,
        pub removed: Vec<i32>,
        pub batches: VecDeque<Vec<RawEvent>>,
        pub fail_add_for: Vec<std::path::PathBuf>,
    }

    impl FakeWatcher {
        pub fn new() -> Self {
            Self {
                next_descriptor: 1,
                ..Default::default()
            }
        }

        pub fn push_batch(&mut self, batch: Vec<RawEvent>) {
            self.batches.push_back(batch);
        }
    }

    impl KernelWatcher for FakeWatcher {
        fn add(&mut self, path: &Path) -> Result<i32> {
            if self.fail_add_for.iter().any(|p| p == path) {
                return Err(crate::error::CoreError::WatchInstallFailure {
                    path: path.to_path_buf(),
                    source: std::io::Error::other("fake failure"),
                });
            }
            let d = self.next_descriptor;
            self.next_descriptor += 1;
            self.added.push(path.to_path_buf());
            Ok(d)
        }

        fn remove(&mut self, descriptor: i32) {
            self.removed.push(descriptor);
        }

        fn read_batch(&mut self) -> Result<Vec<RawEvent>> {
            self.batches
                .pop_front()
                .ok_or(crate::error::CoreError::EndOfStream)
        }
    }
}
