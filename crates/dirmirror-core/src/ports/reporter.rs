//! Reporting port for mirror activity
//!
//! Every copy, delete and observed notification is narrated through an
//! [`IMirrorReporter`]. A single instance is created at startup and shared
//! by the reconciler and the watch loop.
//!
//! Callbacks are synchronous and must not fail: a reporter that cannot
//! deliver a message drops it.

use std::path::Path;

use crate::domain::{ChangeKind, MirrorRoots, ReconcileSummary};

/// Observer for everything the mirror does
pub trait IMirrorReporter: Send + Sync {
    /// Called once after the source and target directories are resolved
    fn roots_resolved(&self, roots: &MirrorRoots);

    /// Called after a file was copied from `from` to `to`
    fn copied(&self, from: &Path, to: &Path);

    /// Called after a file was deleted from the target
    fn deleted(&self, path: &Path);

    /// Called for each notification that was applied to the target
    ///
    /// `path` is the source path of the entry (the source root for
    /// [`ChangeKind::Overflow`]).
    fn event_observed(&self, path: &Path, kind: ChangeKind);

    /// Called when a single copy or delete failed
    ///
    /// # Arguments
    /// * `action` - `"copy"` or `"delete"`
    /// * `path` - The path the operation was applied to
    /// * `error` - The underlying failure
    fn operation_failed(&self, action: &str, path: &Path, error: &anyhow::Error);

    /// Called when the startup reconciliation pass finished
    fn reconciled(&self, summary: &ReconcileSummary);

    /// Called when a resynchronization after lost notifications finished
    fn resynchronized(&self, summary: &ReconcileSummary);
}
