//! Real `KernelWatcher` over Linux inotify.
//!
//! Grounded on lsyncd.c's `add_watch`/`master_loop` for behavior and on
//! the `inotify` crate's own idiom — `watches_by_path`/`paths_by_watch`
//! style dual maps — for API shape (see
//! `examples/other_examples/*mgottschlag-fswatcher-rs__src-inotify.rs*`).
//! The crate's `WatchDescriptor` has no public raw-integer accessor, so
//! this adapter hands out its own sequential `i32` ids to the core and
//! keeps a two-way mapping to the real descriptors.

use std::collections::HashMap;
use std::path::Path;

use inotify::{EventMask as InotifyMask, Inotify, WatchDescriptor, WatchMask};

use lsyncd_core::error::{CoreError, Result};
use lsyncd_core::watcher::{EventMask, KernelWatcher, RawEvent};

const EVENT_BUFFER_SIZE: usize = 4096;

fn watch_mask() -> WatchMask {
    // ONLYDIR/DONT_FOLLOW: restrict to directories and refuse symlink
    // traversal on the watched path itself.
    WatchMask::ATTRIB
        | WatchMask::CLOSE_WRITE
        | WatchMask::CREATE
        | WatchMask::DELETE
        | WatchMask::DELETE_SELF
        | WatchMask::MOVED_FROM
        | WatchMask::MOVED_TO
        | WatchMask::ONLYDIR
        | WatchMask::DONT_FOLLOW
}

fn translate_mask(mask: InotifyMask) -> EventMask {
    let mut out = EventMask::empty();
    if mask.contains(InotifyMask::ATTRIB) {
        out |= EventMask::ATTRIB;
    }
    if mask.contains(InotifyMask::CLOSE_WRITE) {
        out |= EventMask::CLOSE_WRITE;
    }
    if mask.contains(InotifyMask::CREATE) {
        out |= EventMask::CREATE;
    }
    if mask.contains(InotifyMask::DELETE) {
        out |= EventMask::DELETE;
    }
    if mask.contains(InotifyMask::DELETE_SELF) {
        out |= EventMask::DELETE_SELF;
    }
    if mask.contains(InotifyMask::MOVED_FROM) {
        out |= EventMask::MOVED_FROM;
    }
    if mask.contains(InotifyMask::MOVED_TO) {
        out |= EventMask::MOVED_TO;
    }
    if mask.contains(InotifyMask::ISDIR) {
        out |= EventMask::ISDIR;
    }
    if mask.contains(InotifyMask::IGNORED) {
        out |= EventMask::IGNORED;
    }
    out
}

pub struct InotifyWatcher {
    inner: Inotify,
    next_id: i32,
    descriptor_by_id: HashMap<i32, WatchDescriptor>,
    id_by_descriptor: HashMap<WatchDescriptor, i32>,
    buffer: Vec<u8>,
}

impl InotifyWatcher {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            inner: Inotify::init()?,
            next_id: 1,
            descriptor_by_id: HashMap::new(),
            id_by_descriptor: HashMap::new(),
            buffer: vec![0; EVENT_BUFFER_SIZE],
        })
    }
}

impl KernelWatcher for InotifyWatcher {
    fn add(&mut self, path: &Path) -> Result<i32> {
        let descriptor = self
            .inner
            .watches()
            .add(path, watch_mask())
            .map_err(|source| CoreError::WatchInstallFailure {
                path: path.to_path_buf(),
                source,
            })?;

        let id = self.next_id;
        self.next_id += 1;
        self.descriptor_by_id.insert(id, descriptor.clone());
        self.id_by_descriptor.insert(descriptor, id);
        Ok(id)
    }

    fn remove(&mut self, descriptor: i32) {
        if let Some(wd) = self.descriptor_by_id.remove(&descriptor) {
            self.id_by_descriptor.remove(&wd);
            // Idempotent from the core's perspective: the kernel may
            // already have auto-removed the watch.
            let _ = self.inner.watches().remove(wd);
        }
    }

    fn read_batch(&mut self) -> Result<Vec<RawEvent>> {
        let events = self
            .inner
            .read_events_blocking(&mut self.buffer)
            .map_err(CoreError::ReadError)?;

        let mut batch = Vec::new();
        for event in events {
            let id = self
                .id_by_descriptor
                .get(&event.wd)
                .copied()
                .unwrap_or(lsyncd_core::registry::FREE_DESCRIPTOR);
            if id == lsyncd_core::registry::FREE_DESCRIPTOR {
                tracing::error!("inotify event for a watch descriptor we no longer track");
            }
            batch.push(RawEvent {
                descriptor: id,
                mask: translate_mask(event.mask),
                name: event
                    .name
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            });
        }
        Ok(batch)
    }
}
