//! Test doubles shared by the unit tests of this crate

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirmirror_core::domain::{ChangeKind, MirrorRoots, ReconcileSummary};
use dirmirror_core::ports::IMirrorReporter;

/// One reporter callback, as recorded by [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Record {
    RootsResolved,
    Copied(PathBuf, PathBuf),
    Deleted(PathBuf),
    Event(PathBuf, ChangeKind),
    Failed(String, PathBuf),
    /// `(files_copied, files_deleted)`
    Reconciled(u32, u32),
    /// `(files_copied, files_deleted)` of an overflow resync
    Resynced(u32, u32),
}

/// Reporter that keeps every callback in order
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    records: Mutex<Vec<Record>>,
}

impl RecordingReporter {
    pub(crate) fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn events(&self) -> Vec<(PathBuf, ChangeKind)> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Event(path, kind) => Some((path, kind)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}

impl IMirrorReporter for RecordingReporter {
    fn roots_resolved(&self, _roots: &MirrorRoots) {
        self.push(Record::RootsResolved);
    }

    fn copied(&self, from: &Path, to: &Path) {
        self.push(Record::Copied(from.to_path_buf(), to.to_path_buf()));
    }

    fn deleted(&self, path: &Path) {
        self.push(Record::Deleted(path.to_path_buf()));
    }

    fn event_observed(&self, path: &Path, kind: ChangeKind) {
        self.push(Record::Event(path.to_path_buf(), kind));
    }

    fn operation_failed(&self, action: &str, path: &Path, _error: &anyhow::Error) {
        self.push(Record::Failed(action.to_string(), path.to_path_buf()));
    }

    fn reconciled(&self, summary: &ReconcileSummary) {
        self.push(Record::Reconciled(summary.files_copied, summary.files_deleted));
    }

    fn resynchronized(&self, summary: &ReconcileSummary) {
        self.push(Record::Resynced(summary.files_copied, summary.files_deleted));
    }
}
