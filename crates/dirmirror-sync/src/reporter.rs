//! `tracing`-backed implementation of [`IMirrorReporter`]
//!
//! All methods are non-fatal: they only emit log events.

use std::path::Path;

use dirmirror_core::domain::{ChangeKind, MirrorRoots, ReconcileSummary};
use dirmirror_core::ports::reporter::IMirrorReporter;
use tracing::{error, info, warn};

/// Reporter that narrates mirror activity through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl IMirrorReporter for TracingReporter {
    fn roots_resolved(&self, roots: &MirrorRoots) {
        info!("Source: {}", roots.source);
        info!("Target: {}", roots.target);
    }

    fn copied(&self, from: &Path, to: &Path) {
        info!(
            from = %from.display(),
            to = %to.display(),
            "Copied \"{}\" to \"{}\"",
            from.display(),
            to.display()
        );
    }

    fn deleted(&self, path: &Path) {
        info!(path = %path.display(), "Deleted \"{}\"", path.display());
    }

    fn event_observed(&self, path: &Path, kind: ChangeKind) {
        if kind == ChangeKind::Overflow {
            warn!(path = %path.display(), %kind, "Notifications were dropped");
            return;
        }
        info!(
            path = %path.display(),
            %kind,
            "Filename: \"{}\" had event {}",
            path.display(),
            kind
        );
    }

    fn operation_failed(&self, action: &str, path: &Path, err: &anyhow::Error) {
        error!(action, path = %path.display(), error = %format!("{err:#}"), "Operation failed");
    }

    fn reconciled(&self, summary: &ReconcileSummary) {
        info!(
            copied = summary.files_copied,
            deleted = summary.files_deleted,
            errors = summary.errors.len(),
            duration_ms = summary.duration_ms,
            "Finished startup operations"
        );
    }

    fn resynchronized(&self, summary: &ReconcileSummary) {
        info!(
            copied = summary.files_copied,
            deleted = summary.files_deleted,
            errors = summary.errors.len(),
            duration_ms = summary.duration_ms,
            "Resynchronization finished"
        );
    }
}
