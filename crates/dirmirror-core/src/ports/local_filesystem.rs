//! Local filesystem port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Entry types are evaluated without following symbolic links: a symlink
//!   to a regular file is neither a regular file nor a directory.
//! - Only immediate children of a directory are ever listed.

use std::ffi::OsString;
use std::path::Path;
use std::time::SystemTime;

// ============================================================================
// EntryState
// ============================================================================

/// Snapshot of a single path on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    /// Whether anything (file, directory, link, ...) exists at the path
    pub exists: bool,
    /// Whether the entry itself is a regular file
    pub is_file: bool,
    /// Whether the entry itself is a directory
    pub is_dir: bool,
    /// Last modification time (None if unavailable or missing)
    pub modified: Option<SystemTime>,
}

impl EntryState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            is_dir: false,
            modified: None,
        }
    }

    /// Returns true if the entry exists and is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }

    /// Returns true if the entry exists and is a directory
    pub fn is_directory(&self) -> bool {
        self.exists && self.is_dir
    }
}

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for the file operations the mirror performs
///
/// ## Implementation Notes
///
/// - `get_state` must not return an error for missing paths.
/// - `copy_file` always overwrites and must carry the source modification
///   time over to the destination; the reconciler relies on equal mtimes
///   to recognise an already mirrored file.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Names of the regular files directly inside `dir`
    ///
    /// Subdirectories, symbolic links and special files are skipped.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    async fn list_regular_files(&self, dir: &Path) -> anyhow::Result<Vec<OsString>>;

    /// Gets the current state of a path
    ///
    /// Returns `EntryState::not_found()` if the path doesn't exist.
    async fn get_state(&self, path: &Path) -> anyhow::Result<EntryState>;

    /// Copies a regular file, replacing `to` and preserving attributes
    ///
    /// # Errors
    /// Returns an error if `from` is not a regular file or the copy fails
    async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()>;

    /// Deletes a single file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be deleted
    async fn delete_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Whether `path` resolves to an existing entry, following symbolic links
    ///
    /// A dangling link does not exist. Unlike [`get_state`](Self::get_state)
    /// this never treats the link itself as the entry.
    async fn exists(&self, path: &Path) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_state() {
        let state = EntryState::not_found();
        assert!(!state.exists);
        assert!(!state.is_regular_file());
        assert!(!state.is_directory());
        assert!(state.modified.is_none());
    }

    #[test]
    fn test_symlink_like_state_is_neither() {
        let state = EntryState {
            exists: true,
            is_file: false,
            is_dir: false,
            modified: Some(SystemTime::UNIX_EPOCH),
        };
        assert!(!state.is_regular_file());
        assert!(!state.is_directory());
    }
}
