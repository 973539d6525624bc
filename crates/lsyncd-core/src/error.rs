//! Error taxonomy for the watch tree and event dispatcher.
//!
//! Mirrors the kinds enumerated in the design's error handling section,
//! not the original C implementation's ad-hoc `bool`/`exit()` mix.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Global allocator already aborts the process on real allocation
    /// failure; this variant exists so exit-code mapping has something
    /// to map, not because anything constructs it.
    #[error("out of memory")]
    OutOfMemory,

    #[error("path too long: {0}")]
    PathTooLong(PathBuf),

    #[error("cannot add kernel watch for {path}: {source}")]
    WatchInstallFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open directory {path}: {source}")]
    DirectoryOpenFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event references unknown watch descriptor {0}")]
    UnknownDescriptor(i32),

    #[error("watch descriptor {0} already in use")]
    DuplicateDescriptor(i32),

    #[error("sync of {src} -> {dst} returned a transient failure")]
    SyncTransient { src: PathBuf, dst: String },

    #[error("sync of {src} -> {dst} failed fatally")]
    SyncFatal { src: PathBuf, dst: String },

    #[error("kernel event stream ended unexpectedly")]
    EndOfStream,

    #[error("failed reading kernel event stream: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("too many directory excludes (max {max})")]
    TooManyExcludes { max: usize },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Process exit codes, shared by the core and the daemon's outermost
/// error boundary.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const OUT_OF_MEMORY: i32 = 1;
    pub const FILE_NOT_FOUND: i32 = 2;
    pub const SYNC_FAILURE: i32 = 3;
    pub const MISSING_ARGUMENTS: i32 = 4;
    pub const TOO_MANY_EXCLUDES: i32 = 5;
    pub const CHILD_EXEC_FAILURE: i32 = 255;
}

impl CoreError {
    /// Maps this error to the exit code its kind is assigned. Only a
    /// few variants are fatal at the process level; the rest are
    /// handled locally by the dispatcher and never reach this call.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::OutOfMemory => exit_code::OUT_OF_MEMORY,
            CoreError::TooManyExcludes { .. } => exit_code::TOO_MANY_EXCLUDES,
            CoreError::SyncFatal { .. } | CoreError::SyncTransient { .. } => {
                exit_code::SYNC_FAILURE
            }
            CoreError::EndOfStream | CoreError::ReadError(_) => exit_code::SYNC_FAILURE,
            CoreError::DirectoryOpenFailure { .. } | CoreError::WatchInstallFailure { .. } => {
                exit_code::FILE_NOT_FOUND
            }
            _ => exit_code::SYNC_FAILURE,
        }
    }
}
