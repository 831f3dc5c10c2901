//! Startup reconciliation
//!
//! The [`Reconciler`] diffs the flat listings of source and target and
//! converges target onto source.
//!
//! ## Flow
//!
//! 1. **Copy pass**: every regular file in source whose target counterpart
//!    is missing, or has a different modification time, is copied.
//! 2. **Delete pass**: every regular file in target whose same-named source
//!    entry does not exist (symbolic links followed) is deleted.
//!
//! The copy pass completes before the delete pass starts. Content is never
//! compared: equal modification times mean "already mirrored".

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use dirmirror_core::domain::{MirrorRoots, ReconcileSummary};
use dirmirror_core::ports::{ILocalFileSystem, IMirrorReporter};
use tracing::{debug, info};

use crate::operations::{copy_reported, delete_reported};

/// One-shot diff that brings target into agreement with source
pub struct Reconciler {
    fs: Arc<dyn ILocalFileSystem>,
    reporter: Arc<dyn IMirrorReporter>,
    roots: MirrorRoots,
}

impl Reconciler {
    pub fn new(
        fs: Arc<dyn ILocalFileSystem>,
        reporter: Arc<dyn IMirrorReporter>,
        roots: MirrorRoots,
    ) -> Self {
        Self {
            fs,
            reporter,
            roots,
        }
    }

    /// Returns the roots this reconciler converges
    pub fn roots(&self) -> &MirrorRoots {
        &self.roots
    }

    /// Runs the startup reconciliation pass
    ///
    /// Individual copy/delete failures are reported and collected in
    /// [`ReconcileSummary::errors`]; they do not abort the pass.
    ///
    /// # Errors
    /// Returns an error if the source or target directory cannot be listed
    pub async fn reconcile(&self) -> Result<ReconcileSummary> {
        let summary = self.run_pass().await?;
        self.reporter.reconciled(&summary);
        Ok(summary)
    }

    /// Runs the same pass after notifications were lost
    ///
    /// # Errors
    /// Same as [`reconcile`](Self::reconcile)
    pub async fn resync(&self) -> Result<ReconcileSummary> {
        let summary = self.run_pass().await?;
        self.reporter.resynchronized(&summary);
        Ok(summary)
    }

    async fn run_pass(&self) -> Result<ReconcileSummary> {
        let start = Instant::now();
        let mut summary = ReconcileSummary::default();

        info!(
            source = %self.roots.source,
            target = %self.roots.target,
            "Starting reconciliation"
        );

        let source_files = self
            .fs
            .list_regular_files(self.roots.source.as_path())
            .await
            .context("Failed to list source directory")?;

        for name in &source_files {
            self.copy_if_stale(name, &mut summary).await;
        }

        let target_files = self
            .fs
            .list_regular_files(self.roots.target.as_path())
            .await
            .context("Failed to list target directory")?;

        for name in &target_files {
            self.delete_if_orphaned(name, &mut summary).await;
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }

    async fn copy_if_stale(&self, name: &OsStr, summary: &mut ReconcileSummary) {
        let (from, to) = match (self.roots.source_path(name), self.roots.target_path(name)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(e), _) | (_, Err(e)) => {
                summary.errors.push(e.to_string());
                return;
            }
        };

        match self.is_stale(&from, &to).await {
            Ok(false) => debug!(name = ?name, "already synchronized"),
            Ok(true) => {
                match copy_reported(self.fs.as_ref(), self.reporter.as_ref(), &from, &to).await {
                    Ok(()) => summary.files_copied += 1,
                    Err(e) => summary.errors.push(e),
                }
            }
            Err(e) => {
                self.reporter.operation_failed("copy", &from, &e);
                summary.errors.push(format!("stat {}: {e:#}", from.display()));
            }
        }
    }

    /// True when `to` is missing or its modification time differs from `from`
    async fn is_stale(&self, from: &Path, to: &Path) -> Result<bool> {
        let target = self.fs.get_state(to).await?;
        if !target.exists {
            return Ok(true);
        }
        let source = self.fs.get_state(from).await?;
        Ok(source.modified != target.modified)
    }

    async fn delete_if_orphaned(&self, name: &OsStr, summary: &mut ReconcileSummary) {
        let (counterpart, path) = match (self.roots.source_path(name), self.roots.target_path(name))
        {
            (Ok(counterpart), Ok(path)) => (counterpart, path),
            (Err(e), _) | (_, Err(e)) => {
                summary.errors.push(e.to_string());
                return;
            }
        };

        match self.fs.exists(&counterpart).await {
            Ok(true) => {}
            Ok(false) => match delete_reported(self.fs.as_ref(), self.reporter.as_ref(), &path).await {
                Ok(()) => summary.files_deleted += 1,
                Err(e) => summary.errors.push(e),
            },
            Err(e) => {
                self.reporter.operation_failed("delete", &path, &e);
                summary
                    .errors
                    .push(format!("stat {}: {e:#}", counterpart.display()));
            }
        }
    }
}
