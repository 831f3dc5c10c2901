//! Notification-driven incremental mirroring
//!
//! The [`WatchLoop`] consumes batches produced by the
//! [`FileWatcher`](crate::watcher::FileWatcher) and applies each
//! notification to the target directory:
//!
//! - `Delete`: remove the target counterpart if it is a regular file
//! - `Create` / `Modify`: copy the source entry if it is a regular file
//! - `Overflow`: re-run the full reconciliation (or ignore, if disabled)
//!
//! Failures on one notification are reported and never stop the loop.
//! The loop ends when the shutdown token is cancelled, when the source
//! directory stops being a directory, or when the watcher goes away.

use std::sync::Arc;

use anyhow::Result;
use dirmirror_core::config::MirrorConfig;
use dirmirror_core::domain::{ChangeKind, MirrorRoots};
use dirmirror_core::ports::{ILocalFileSystem, IMirrorReporter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::operations::{copy_reported, delete_reported};
use crate::reconciler::Reconciler;
use crate::watcher::{ChangeBatch, ChangeEvent};

/// Tunables for the watch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Re-run reconciliation when notifications were lost
    pub resync_on_overflow: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            resync_on_overflow: true,
        }
    }
}

impl From<&MirrorConfig> for WatchOptions {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            resync_on_overflow: config.resync_on_overflow,
        }
    }
}

/// Why the watch loop stopped; every variant is a graceful exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The shutdown token was cancelled
    Cancelled,
    /// The source directory was removed or became inaccessible
    SourceInvalidated,
    /// The watcher was dropped and no further batches can arrive
    WatcherClosed,
}

/// Applies source notifications to the target, one batch at a time
pub struct WatchLoop {
    fs: Arc<dyn ILocalFileSystem>,
    reporter: Arc<dyn IMirrorReporter>,
    reconciler: Reconciler,
    options: WatchOptions,
}

impl WatchLoop {
    pub fn new(
        fs: Arc<dyn ILocalFileSystem>,
        reporter: Arc<dyn IMirrorReporter>,
        reconciler: Reconciler,
        options: WatchOptions,
    ) -> Self {
        Self {
            fs,
            reporter,
            reconciler,
            options,
        }
    }

    /// Returns the roots the loop mirrors between
    pub fn roots(&self) -> &MirrorRoots {
        self.reconciler.roots()
    }

    /// Runs until cancelled, until the source becomes invalid, or until
    /// the watcher closes the channel
    ///
    /// Waiting for the next batch has no timeout.
    pub async fn run(
        &self,
        mut rx: mpsc::Receiver<ChangeBatch>,
        shutdown: CancellationToken,
    ) -> Result<WatchExit> {
        info!(source = %self.roots().source, "Watch loop started");

        loop {
            let mut batch = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    return Ok(WatchExit::Cancelled);
                }
                next = rx.recv() => match next {
                    Some(batch) => batch,
                    None => {
                        warn!("Watcher channel closed");
                        return Ok(WatchExit::WatcherClosed);
                    }
                },
            };

            while let Ok(more) = rx.try_recv() {
                batch.extend(more);
            }

            self.apply_batch(&batch).await;

            if !self.source_is_valid().await {
                info!(source = %self.roots().source, "Source directory is no longer accessible");
                return Ok(WatchExit::SourceInvalidated);
            }
        }
    }

    /// Applies every notification of `batch` in order
    ///
    /// Overflow markers are coalesced into a single resynchronization that
    /// runs after the other notifications.
    pub async fn apply_batch(&self, batch: &[ChangeEvent]) {
        debug!(events = batch.len(), "Processing batch");
        let mut overflowed = false;

        for event in batch {
            if event.kind == ChangeKind::Overflow {
                overflowed = true;
                continue;
            }
            self.apply_event(event).await;
        }

        if overflowed {
            self.handle_overflow().await;
        }
    }

    async fn apply_event(&self, event: &ChangeEvent) {
        let roots = self.roots();
        let Some(name) = roots.source.child_name(&event.path) else {
            debug!(path = %event.path.display(), "Ignoring path outside source directory");
            return;
        };
        let target = match roots.target_path(name) {
            Ok(target) => target,
            Err(e) => {
                warn!(path = %event.path.display(), error = %e, "Ignoring unmappable entry");
                return;
            }
        };

        match event.kind {
            ChangeKind::Delete => match self.fs.get_state(&target).await {
                Ok(state) if state.is_regular_file() => {
                    self.reporter.event_observed(&event.path, event.kind);
                    if delete_reported(self.fs.as_ref(), self.reporter.as_ref(), &target)
                        .await
                        .is_err()
                    {
                        debug!(path = %event.path.display(), "Delete left unapplied");
                    }
                }
                Ok(_) => debug!(target = %target.display(), "No regular file to delete"),
                Err(e) => self.reporter.operation_failed("delete", &target, &e),
            },
            ChangeKind::Create | ChangeKind::Modify => {
                match self.fs.get_state(&event.path).await {
                    Ok(state) if state.is_regular_file() => {
                        self.reporter.event_observed(&event.path, event.kind);
                        if copy_reported(
                            self.fs.as_ref(),
                            self.reporter.as_ref(),
                            &event.path,
                            &target,
                        )
                        .await
                        .is_err()
                        {
                            debug!(path = %event.path.display(), "Copy left unapplied");
                        }
                    }
                    Ok(_) => debug!(path = %event.path.display(), "Ignoring non-regular entry"),
                    Err(e) => self.reporter.operation_failed("copy", &event.path, &e),
                }
            }
            ChangeKind::Overflow => {}
        }
    }

    async fn handle_overflow(&self) {
        self.reporter
            .event_observed(self.roots().source.as_path(), ChangeKind::Overflow);

        if !self.options.resync_on_overflow {
            warn!("Resynchronization on overflow is disabled; target may have drifted");
            return;
        }

        info!("Resynchronizing after lost notifications");
        if let Err(e) = self.reconciler.resync().await {
            error!(error = %format!("{e:#}"), "Resynchronization failed");
        }
    }

    async fn source_is_valid(&self) -> bool {
        matches!(
            self.fs.get_state(self.roots().source.as_path()).await,
            Ok(state) if state.is_directory()
        )
    }
}
