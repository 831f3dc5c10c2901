//! dirmirror Sync - One-way flat directory mirroring
//!
//! Provides:
//! - Startup reconciliation of target against source
//! - Notification-driven incremental mirroring
//! - Overflow-triggered resynchronization
//!
//! ## Modules
//!
//! - [`setup`] - Resolve and validate the source/target roots
//! - [`filesystem`] - Local filesystem adapter (copy with timestamps, delete)
//! - [`reconciler`] - One-shot diff that converges target onto source
//! - [`watcher`] - `notify` subscription on the source directory
//! - [`watch_loop`] - Applies notification batches to the target
//! - [`reporter`] - `tracing`-backed narration of mirror activity

pub mod filesystem;
mod operations;
pub mod reconciler;
pub mod reporter;
pub mod setup;
#[cfg(test)]
mod test_support;
pub mod watch_loop;
pub mod watcher;

use std::path::PathBuf;

use thiserror::Error;

pub use reconciler::Reconciler;
pub use setup::prepare_roots;
pub use watch_loop::{WatchExit, WatchLoop, WatchOptions};
pub use watcher::{ChangeEvent, FileWatcher};

/// Fatal errors raised while preparing the mirror roots
///
/// None of these are retried; the caller is expected to abort.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The source path does not exist
    #[error("Source does not exist: {0}")]
    SourceMissing(PathBuf),

    /// The source path exists but is not a directory
    #[error("Source has to be a directory: {0}")]
    SourceNotDirectory(PathBuf),

    /// The target path exists but is not a directory
    #[error("Target has to be a directory: {0}")]
    TargetNotDirectory(PathBuf),

    /// Source and target resolve to the same directory
    #[error("Source and target are the same directory: {0}")]
    SameDirectory(PathBuf),

    /// A path could not be turned into a valid mirror root
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] dirmirror_core::domain::DomainError),

    /// An I/O error occurred while resolving or creating a path
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path being resolved or created
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}
