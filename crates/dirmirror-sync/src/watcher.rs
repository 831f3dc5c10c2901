//! Source directory watching
//!
//! Provides a [`FileWatcher`] that wraps the `notify` crate to monitor the
//! source directory (non-recursively), converting raw OS events into batches
//! of [`ChangeEvent`] values.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue / ...
//!       │
//!       ▼
//!  FileWatcher  ──→  mpsc::channel<Vec<ChangeEvent>>  ──→  WatchLoop
//! ```
//!
//! An empty batch is a wake-up: something happened to the watched directory
//! itself (or the backend reported an error) and the loop should re-check
//! whether the subscription is still valid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dirmirror_core::domain::{ChangeKind, MirrorRoot};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// Notifications delivered together by one backend callback
pub type ChangeBatch = Vec<ChangeEvent>;

// ============================================================================
// ChangeEvent
// ============================================================================

/// A change notification for an entry directly inside the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// What happened
    pub kind: ChangeKind,
    /// Absolute source path of the entry (the source root for overflows)
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Marker for notifications lost by the backend
    pub fn overflow(root: &MirrorRoot) -> Self {
        Self::new(ChangeKind::Overflow, root.as_path())
    }
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Live subscription on the source directory
///
/// Dropping the watcher cancels the subscription and closes the channel
/// returned by [`FileWatcher::new`].
pub struct FileWatcher {
    /// The underlying notify watcher instance
    watcher: RecommendedWatcher,
    /// The watched directory
    root: MirrorRoot,
}

impl FileWatcher {
    /// Starts watching `root` for create, modify and delete notifications
    ///
    /// # Arguments
    /// * `root` - The source directory
    /// * `capacity` - Number of batches buffered before the backend thread
    ///   falls back to an overflow marker
    ///
    /// # Errors
    /// Returns an error if the OS watcher cannot be created or the
    /// directory cannot be watched (missing, permissions, watch limit)
    pub fn new(root: &MirrorRoot, capacity: usize) -> Result<(Self, mpsc::Receiver<ChangeBatch>)> {
        let (tx, rx) = mpsc::channel::<ChangeBatch>(capacity.max(1));
        let callback_root = root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                let batch = match res {
                    Ok(event) => match map_notify_event(&callback_root, &event) {
                        Some(batch) => batch,
                        None => return,
                    },
                    Err(err) => {
                        error!(error = %err, "File watcher error");
                        Vec::new()
                    }
                };
                forward(&tx, &callback_root, batch);
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(root.as_path(), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path: {}", root))?;

        info!(path = %root, capacity, "Watching source directory");

        Ok((
            Self {
                watcher,
                root: root.clone(),
            },
            rx,
        ))
    }

    /// Stops watching; further notifications are no longer delivered
    pub fn unwatch(mut self) -> Result<()> {
        info!(path = %self.root, "Stopping watch");
        self.watcher
            .unwatch(self.root.as_path())
            .with_context(|| format!("Failed to unwatch path: {}", self.root))
    }
}

/// Sends a batch from the backend thread
///
/// When the buffer is full the batch is dropped and replaced by an overflow
/// marker, which waits for room so the loop is guaranteed to resync.
fn forward(tx: &mpsc::Sender<ChangeBatch>, root: &MirrorRoot, batch: ChangeBatch) {
    match tx.try_send(batch) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => {
            warn!(dropped = dropped.len(), "Change buffer full, signalling overflow");
            if tx.blocking_send(vec![ChangeEvent::overflow(root)]).is_err() {
                debug!("Receiver dropped while signalling overflow");
            }
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Failed to send change batch (receiver dropped)");
        }
    }
}

// ============================================================================
// Event mapping - notify::Event → ChangeBatch
// ============================================================================

/// Converts a `notify::Event` into a batch of [`ChangeEvent`]s
///
/// Maps the notify event kinds as follows:
/// - events flagged for rescan -> `Overflow`
/// - `Create(*)` -> `Create`
/// - `Modify(Name(From))` -> `Delete`
/// - `Modify(Name(To))` -> `Create`
/// - `Modify(Name(Both))` with 2 paths -> `Delete(old)` + `Create(new)`
/// - other `Modify(*)` and `Any` -> `Modify`
/// - `Remove(*)` -> `Delete`
///
/// Paths that are not direct children of `root` are dropped. Returns `None`
/// when nothing is left and the event did not concern `root` itself, and
/// for ignored kinds (e.g. access events).
fn map_notify_event(root: &MirrorRoot, event: &notify::Event) -> Option<ChangeBatch> {
    if event.need_rescan() {
        debug!(kind = ?event.kind, "Backend requested rescan");
        return Some(vec![ChangeEvent::overflow(root)]);
    }

    let paths = &event.paths;
    let all = |kind: ChangeKind| tag_all(kind, paths);

    let mapped = match &event.kind {
        EventKind::Create(_) => all(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(ChangeKind::Delete),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
            vec![(ChangeKind::Delete, &paths[0]), (ChangeKind::Create, &paths[1])]
        }
        EventKind::Modify(_) | EventKind::Any => all(ChangeKind::Modify),
        EventKind::Remove(_) => all(ChangeKind::Delete),
        _ => {
            debug!(kind = ?event.kind, "Ignoring event kind");
            return None;
        }
    };

    let touches_root = paths.iter().any(|p| p.as_path() == root.as_path());
    let batch: ChangeBatch = mapped
        .into_iter()
        .filter(|(_, path)| root.child_name(path).is_some())
        .map(|(kind, path)| ChangeEvent::new(kind, path.clone()))
        .collect();

    if batch.is_empty() && !touches_root {
        debug!(kind = ?event.kind, paths = ?paths, "Event outside source directory");
        return None;
    }

    debug!(kind = ?event.kind, mapped = batch.len(), touches_root, "Mapped event");
    Some(batch)
}

fn tag_all(kind: ChangeKind, paths: &[PathBuf]) -> Vec<(ChangeKind, &PathBuf)> {
    paths.iter().map(|p| (kind, p)).collect()
}

// ============================================================================
// Unit tests
// ============================================================================
