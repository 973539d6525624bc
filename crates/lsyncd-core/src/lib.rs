//! The hard core of a live mirror-syncing daemon: a watch tree, a path
//! builder, an exclude filter, and an event dispatcher, expressed
//! against the `KernelWatcher`/`SyncInvoker` traits so none of it
//! touches the OS directly. `lsyncd-daemon` supplies the real
//! implementations of those traits and wires this crate into a running
//! process.

pub mod bootstrap;
pub mod dispatcher;
pub mod error;
pub mod exclude;
pub mod path;
pub mod registry;
pub mod sync;
pub mod watcher;

pub use bootstrap::{bootstrap, root_prefix, subtree_install};
pub use dispatcher::EventDispatcher;
pub use error::{exit_code, CoreError, Result};
pub use exclude::{ExcludePatterns, MAX_EXCLUDES};
pub use registry::{WatchNode, WatchRegistry, FREE_DESCRIPTOR, NO_PARENT};
pub use sync::{build_args, DryRunInvoker, SyncInvoker, SyncOutcome};
pub use watcher::{EventMask, KernelWatcher, RawEvent};
