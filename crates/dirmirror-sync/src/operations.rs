//! Reported copy/delete primitives shared by the reconciler and the watch loop
//!
//! Failures are reported and swallowed: the caller moves on to the next
//! entry. The returned `Result` only tells the caller whether to count the
//! operation.

use std::path::Path;

use dirmirror_core::ports::{ILocalFileSystem, IMirrorReporter};

/// Copy `from` over `to`, reporting the outcome
pub(crate) async fn copy_reported(
    fs: &dyn ILocalFileSystem,
    reporter: &dyn IMirrorReporter,
    from: &Path,
    to: &Path,
) -> Result<(), String> {
    match fs.copy_file(from, to).await {
        Ok(()) => {
            reporter.copied(from, to);
            Ok(())
        }
        Err(e) => {
            reporter.operation_failed("copy", from, &e);
            Err(format!("copy {}: {e:#}", from.display()))
        }
    }
}

/// Delete `path`, reporting the outcome
pub(crate) async fn delete_reported(
    fs: &dyn ILocalFileSystem,
    reporter: &dyn IMirrorReporter,
    path: &Path,
) -> Result<(), String> {
    match fs.delete_file(path).await {
        Ok(()) => {
            reporter.deleted(path);
            Ok(())
        }
        Err(e) => {
            reporter.operation_failed("delete", path, &e);
            Err(format!("delete {}: {e:#}", path.display()))
        }
    }
}
