//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **No link following**: entry types come from `symlink_metadata` and
//!   `DirEntry::file_type`, so a symlink is never mistaken for the file it
//!   points to.
//! - **Replace, not write-through**: an existing regular destination is
//!   unlinked before copying, so a read-only destination is replaced rather
//!   than written into. Destinations that are directories or symlinks are
//!   left alone and the copy fails.
//! - **Timestamps**: after the byte copy the source access and
//!   modification times are applied with `filetime`; permissions are
//!   carried by `tokio::fs::copy` itself.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context};
use dirmirror_core::ports::local_filesystem::{EntryState, ILocalFileSystem};
use filetime::FileTime;
use tracing::{debug, instrument};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// Zero-sized: every operation takes its context from the path arguments.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn list_regular_files(&self, dir: &Path) -> anyhow::Result<Vec<OsString>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list directory {}", dir.display()))?
        {
            // DirEntry::file_type does not traverse symlinks.
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if file_type.is_file() {
                names.push(entry.file_name());
            } else {
                debug!(name = ?entry.file_name(), "skipping non-regular entry");
            }
        }

        names.sort();
        debug!(count = names.len(), "listed regular files");
        Ok(names)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn get_state(&self, path: &Path) -> anyhow::Result<EntryState> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("path not found");
                return Ok(EntryState::not_found());
            }
            Err(e) => return Err(e.into()),
        };

        let file_type = metadata.file_type();
        Ok(EntryState {
            exists: true,
            is_file: file_type.is_file(),
            is_dir: file_type.is_dir(),
            modified: metadata.modified().ok(),
        })
    }

    #[instrument(skip(self), fields(from = %from.display(), to = %to.display()))]
    async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        let source_meta = tokio::fs::symlink_metadata(from)
            .await
            .with_context(|| format!("Failed to stat {}", from.display()))?;
        if !source_meta.file_type().is_file() {
            bail!("Not a regular file: {}", from.display());
        }

        match tokio::fs::symlink_metadata(to).await {
            Ok(existing) if existing.file_type().is_file() => {
                debug!("removing existing destination");
                tokio::fs::remove_file(to)
                    .await
                    .with_context(|| format!("Failed to replace {}", to.display()))?;
            }
            Ok(_) => bail!("Destination is not a regular file: {}", to.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let bytes = tokio::fs::copy(from, to).await.with_context(|| {
            format!("Failed to copy {} to {}", from.display(), to.display())
        })?;

        let atime = FileTime::from_last_access_time(&source_meta);
        let mtime = FileTime::from_last_modification_time(&source_meta);
        let dest = to.to_path_buf();
        tokio::task::spawn_blocking(move || filetime::set_file_times(&dest, atime, mtime))
            .await?
            .with_context(|| format!("Failed to set timestamps on {}", to.display()))?;

        debug!(bytes, "copy complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn delete_file(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        debug!("delete complete");
        Ok(())
    }

    async fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    // ------------------------------------------------------------------
    // list_regular_files
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_only_regular_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.txt", "b");
        write(&dir, "a.txt", "a");
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link.txt"))
            .unwrap();

        let fs = LocalFileSystemAdapter::new();
        let names = fs.list_regular_files(dir.path()).await.unwrap();

        assert_eq!(names, vec![OsString::from("a.txt"), OsString::from("b.txt")]);
    }

    #[tokio::test]
    async fn test_list_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystemAdapter::new();
        let result = fs.list_regular_files(&dir.path().join("missing")).await;
        assert!(result.is_err());
    }

    // ------------------------------------------------------------------
    // get_state
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_state_file_and_directory() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "state.txt", "twelve bytes");
        let fs = LocalFileSystemAdapter::new();

        let state = fs.get_state(&file).await.unwrap();
        assert!(state.is_regular_file());
        assert!(state.modified.is_some());

        let state = fs.get_state(dir.path()).await.unwrap();
        assert!(state.is_directory());
        assert!(!state.is_regular_file());
    }

    #[tokio::test]
    async fn test_get_state_not_found() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystemAdapter::new();

        let state = fs.get_state(&dir.path().join("nope")).await.unwrap();
        assert_eq!(state, EntryState::not_found());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_get_state_does_not_follow_symlink() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "real.txt", "x");
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&file, &link).unwrap();
        let fs = LocalFileSystemAdapter::new();

        let state = fs.get_state(&link).await.unwrap();
        assert!(state.exists);
        assert!(!state.is_regular_file());
        assert!(!state.is_directory());
    }

    // ------------------------------------------------------------------
    // copy_file
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_copy_preserves_content_and_mtime() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let from = write(&src, "a.txt", "hi");
        let mtime = FileTime::from_unix_time(1_600_000_000, 123_000_000);
        filetime::set_file_mtime(&from, mtime).unwrap();

        let to = dst.path().join("a.txt");
        let fs = LocalFileSystemAdapter::new();
        fs.copy_file(&from, &to).await.unwrap();

        assert_eq!(std::fs::read_to_string(&to).unwrap(), "hi");
        let copied = std::fs::metadata(&to).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
    }

    #[tokio::test]
    async fn test_copy_overwrites_existing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let from = write(&src, "a.txt", "new content");
        let to = write(&dst, "a.txt", "old");

        let fs = LocalFileSystemAdapter::new();
        fs.copy_file(&from, &to).await.unwrap();

        assert_eq!(std::fs::read_to_string(&to).unwrap(), "new content");
        assert_eq!(
            std::fs::metadata(&to).unwrap().modified().unwrap(),
            std::fs::metadata(&from).unwrap().modified().unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_replaces_read_only_destination() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let from = write(&src, "a.txt", "fresh");
        let to = write(&dst, "a.txt", "stale");
        std::fs::set_permissions(&to, std::fs::Permissions::from_mode(0o444)).unwrap();

        let fs = LocalFileSystemAdapter::new();
        fs.copy_file(&from, &to).await.unwrap();

        assert_eq!(std::fs::read_to_string(&to).unwrap(), "fresh");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_leaves_symlink_destination_alone() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let from = write(&src, "a.txt", "new");
        let elsewhere = write(&dst, "elsewhere.txt", "keep");
        let to = dst.path().join("a.txt");
        std::os::unix::fs::symlink(&elsewhere, &to).unwrap();

        let fs = LocalFileSystemAdapter::new();
        assert!(fs.copy_file(&from, &to).await.is_err());
        assert!(std::fs::symlink_metadata(&to).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&elsewhere).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_copy_rejects_directory_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();

        let fs = LocalFileSystemAdapter::new();
        let result = fs
            .copy_file(&src.path().join("sub"), &dst.path().join("sub"))
            .await;
        assert!(result.is_err());
        assert!(!dst.path().join("sub").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_rejects_symlink_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let real = write(&src, "real.txt", "x");
        let link = src.path().join("link.txt");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let fs = LocalFileSystemAdapter::new();
        let result = fs.copy_file(&link, &dst.path().join("link.txt")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let fs = LocalFileSystemAdapter::new();

        let result = fs
            .copy_file(&src.path().join("gone.txt"), &dst.path().join("gone.txt"))
            .await;
        assert!(result.is_err());
    }

    // ------------------------------------------------------------------
    // delete_file / exists
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_file() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "bye.txt", "bye");
        let fs = LocalFileSystemAdapter::new();

        fs.delete_file(&file).await.unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystemAdapter::new();
        assert!(fs.delete_file(&dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_exists_for_files_and_directories() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "here.txt", "x");
        let fs = LocalFileSystemAdapter::new();

        assert!(fs.exists(&file).await.unwrap());
        assert!(fs.exists(dir.path()).await.unwrap());
        assert!(!fs.exists(&dir.path().join("nope")).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exists_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let real = write(&dir, "real.txt", "r");
        let live = dir.path().join("live");
        let dangling = dir.path().join("dangling");
        std::os::unix::fs::symlink(&real, &live).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), &dangling).unwrap();
        let fs = LocalFileSystemAdapter::new();

        assert!(fs.exists(&live).await.unwrap());
        assert!(!fs.exists(&dangling).await.unwrap());
        assert!(fs.get_state(&dangling).await.unwrap().exists);
    }
}
