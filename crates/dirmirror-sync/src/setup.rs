//! Resolution and validation of the mirror roots
//!
//! Runs once at startup. Every failure is a [`SetupError`] returned to the
//! caller, which decides how the process exits.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dirmirror_core::domain::{MirrorRoot, MirrorRoots};
use tracing::{debug, info};

use crate::SetupError;

/// Resolve `source` and `target` into validated, symlink-free roots
///
/// - `source` must exist and be a directory (symlinks to directories are
///   accepted and resolved).
/// - `target` is created, parents included, when missing; when present it
///   must be a directory.
/// - Both must not resolve to the same directory.
///
/// Relative paths are interpreted against the current working directory.
///
/// # Errors
/// Returns the first [`SetupError`] encountered
pub async fn prepare_roots(source: &Path, target: &Path) -> Result<MirrorRoots, SetupError> {
    let source = absolutize(source)?;
    let target = absolutize(target)?;

    match tokio::fs::metadata(&source).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(SetupError::SourceNotDirectory(source)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SetupError::SourceMissing(source))
        }
        Err(e) => return Err(io_error(&source, e)),
    }
    let source = canonicalize(&source).await?;

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(SetupError::TargetNotDirectory(target)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| io_error(&target, e))?;
            info!(target = %target.display(), "Created target folder");
        }
        Err(e) => return Err(io_error(&target, e)),
    }
    let target = canonicalize(&target).await?;

    if source == target {
        return Err(SetupError::SameDirectory(source));
    }

    debug!(source = %source.display(), target = %target.display(), "Roots resolved");
    Ok(MirrorRoots::new(
        MirrorRoot::new(source)?,
        MirrorRoot::new(target)?,
    ))
}

fn absolutize(path: &Path) -> Result<PathBuf, SetupError> {
    if path.as_os_str().is_empty() {
        return Err(SetupError::InvalidPath(
            dirmirror_core::domain::DomainError::InvalidPath("empty path".to_string()),
        ));
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| io_error(path, e))?;
    Ok(cwd.join(path))
}

async fn canonicalize(path: &Path) -> Result<PathBuf, SetupError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> SetupError {
    SetupError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_prepare_existing_directories() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let roots = prepare_roots(src.path(), dst.path()).await.unwrap();
        assert_eq!(
            roots.source.as_path(),
            std::fs::canonicalize(src.path()).unwrap()
        );
        assert_eq!(
            roots.target.as_path(),
            std::fs::canonicalize(dst.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let base = TempDir::new().unwrap();
        let result = prepare_roots(&base.path().join("nope"), &base.path().join("out")).await;
        assert!(matches!(result, Err(SetupError::SourceMissing(_))));
        // Target must not have been created for a failed setup
        assert!(!base.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_source_file_is_fatal() {
        let base = TempDir::new().unwrap();
        let file = base.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let result = prepare_roots(&file, &base.path().join("out")).await;
        assert!(matches!(result, Err(SetupError::SourceNotDirectory(_))));
    }

    #[tokio::test]
    async fn test_missing_target_is_created_with_parents() {
        let src = TempDir::new().unwrap();
        let base = TempDir::new().unwrap();
        let target = base.path().join("a/b/c");

        let roots = prepare_roots(src.path(), &target).await.unwrap();
        assert!(target.is_dir());
        assert_eq!(roots.target.as_path(), std::fs::canonicalize(&target).unwrap());
    }

    #[tokio::test]
    async fn test_target_file_is_fatal() {
        let src = TempDir::new().unwrap();
        let base = TempDir::new().unwrap();
        let file = base.path().join("target.txt");
        std::fs::write(&file, "x").unwrap();

        let result = prepare_roots(src.path(), &file).await;
        assert!(matches!(result, Err(SetupError::TargetNotDirectory(_))));
    }

    #[tokio::test]
    async fn test_same_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = prepare_roots(dir.path(), &dir.path().join(".")).await;
        assert!(matches!(result, Err(SetupError::SameDirectory(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_source_is_resolved() {
        let real = TempDir::new().unwrap();
        let base = TempDir::new().unwrap();
        let link = base.path().join("link");
        std::os::unix::fs::symlink(real.path(), &link).unwrap();

        let roots = prepare_roots(&link, &base.path().join("out")).await.unwrap();
        assert_eq!(
            roots.source.as_path(),
            std::fs::canonicalize(real.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_path_is_invalid() {
        let dst = TempDir::new().unwrap();
        let result = prepare_roots(Path::new(""), dst.path()).await;
        assert!(matches!(result, Err(SetupError::InvalidPath(_))));
    }
}
