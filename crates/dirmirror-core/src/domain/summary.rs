//! Result of a reconciliation pass

/// Summary of a completed reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Number of files copied from source to target
    pub files_copied: u32,
    /// Number of files deleted from target
    pub files_deleted: u32,
    /// Errors encountered on individual files (non-fatal)
    pub errors: Vec<String>,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl ReconcileSummary {
    /// Total number of copy and delete operations performed
    pub fn operations(&self) -> u32 {
        self.files_copied + self.files_deleted
    }

    /// Returns true if no file failed during the pass
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
