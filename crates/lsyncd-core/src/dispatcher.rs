//! The event dispatcher: the control core. Pulls event batches from
//! the `KernelWatcher`, classifies each event, mutates the
//! `WatchRegistry` accordingly, and decides which directory pair(s) to
//! hand to the `SyncInvoker`, including parent-retry escalation.
//!
//! Ground truth is lsyncd.c's `handle_event` and `master_loop`.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::bootstrap::subtree_install;
use crate::error::{CoreError, Result};
use crate::exclude::ExcludePatterns;
use crate::path;
use crate::registry::{WatchRegistry, NO_PARENT};
use crate::sync::{SyncInvoker, SyncOutcome};
use crate::watcher::{EventMask, KernelWatcher, RawEvent};

pub struct EventDispatcher<'a, W, S> {
    pub registry: &'a mut WatchRegistry,
    pub watcher: &'a mut W,
    pub invoker: &'a mut S,
    pub exclude: &'a ExcludePatterns,
    /// Absolute prefix of the source root, with a trailing slash.
    pub root_prefix: String,
    /// Opaque destination specifier (e.g. `host::module/`).
    pub dest_root: String,
    pub terminating: &'a AtomicBool,
}

impl<'a, W, S> EventDispatcher<'a, W, S>
where
    W: KernelWatcher,
    S: SyncInvoker,
{
    /// The master loop: while not terminating, read one batch and
    /// dispatch every event in it, in kernel delivery order, with no
    /// reordering, deduplication, or coalescing. Returns on the two
    /// fatal conditions: event-stream failure, or an unrecoverable
    /// `SyncFatal` escalation.
    pub fn run(&mut self) -> Result<()> {
        while !self.terminating.load(Ordering::SeqCst) {
            let batch = match self.watcher.read_batch() {
                Ok(b) => b,
                Err(CoreError::EndOfStream) => return Err(CoreError::EndOfStream),
                Err(e) => return Err(e),
            };

            for event in batch {
                self.dispatch_event(event)?;
            }
        }
        Ok(())
    }

    /// Processes a single event. lsyncd.c's `handle_event` returns a
    /// value its caller always ignores; here that's made explicit by
    /// returning `()` for everything recoverable and only surfacing an
    /// `Err` for the one unrecoverable case (a fatal sync escalation).
    fn dispatch_event(&mut self, event: RawEvent) -> Result<()> {
        if event.is_ignored() {
            return Ok(());
        }

        if !event.name.is_empty() && self.exclude.matches(&event.name) {
            return Ok(());
        }

        let Some(node) = self.registry.lookup_by_descriptor(event.descriptor) else {
            tracing::error!(
                "received an event that doesn't match any watched directory (wd={})",
                event.descriptor
            );
            return Ok(());
        };

        if event.is_dir() && event.mask.intersects(EventMask::CREATE | EventMask::MOVED_TO) {
            subtree_install(
                self.registry,
                self.watcher,
                self.exclude,
                &self.root_prefix,
                node,
                &event.name,
                None,
                self.terminating,
            );
        }

        if event.is_dir()
            && event
                .mask
                .intersects(EventMask::DELETE | EventMask::MOVED_FROM)
        {
            if let Some(child) = self.registry.find_child(node, &event.name) {
                self.registry.remove(child, |d| self.watcher.remove(d));
            }
        }

        if event.mask.triggers_sync() {
            self.sync_with_escalation(node)?;
        }

        Ok(())
    }

    /// Runs a non-recursive sync of `node`'s directory; on `Transient`,
    /// escalates to a recursive sync of its parent — the design's main
    /// durability mechanism: when an incremental delta desyncs, retry
    /// with a full subtree re-scan one level up. A transient or fatal
    /// outcome from the escalated retry is fatal to the daemon.
    fn sync_with_escalation(&mut self, node: usize) -> Result<()> {
        let src = path::source_path(self.registry, &self.root_prefix, node)?;
        let dst = path::dest_path(self.registry, &self.dest_root, node)?;

        let outcome = self.invoker.sync(&src, &dst, false);
        if outcome == SyncOutcome::Ok {
            return Ok(());
        }

        let Some(parent_node) = self.registry.get(node).map(|n| n.parent) else {
            return Ok(());
        };
        if parent_node == NO_PARENT {
            return Ok(());
        }

        let parent_src = path::source_path(self.registry, &self.root_prefix, parent_node)?;
        let parent_dst = path::dest_path(self.registry, &self.dest_root, parent_node)?;

        tracing::warn!("retrying directory resync with {} -> {}", parent_src, parent_dst);
        match self.invoker.sync(&parent_src, &parent_dst, true) {
            SyncOutcome::Ok => Ok(()),
            SyncOutcome::Transient => Err(CoreError::SyncTransient {
                src: parent_src.into(),
                dst: parent_dst,
            }),
            SyncOutcome::Fatal => Err(CoreError::SyncFatal {
                src: parent_src.into(),
                dst: parent_dst,
            }),
        }
    }
}
