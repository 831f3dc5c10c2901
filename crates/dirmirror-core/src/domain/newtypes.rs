//! Newtype wrappers for mirror paths
//!
//! A [`MirrorRoot`] is always absolute and lexically normalized. Whether it
//! exists on disk is checked by the setup step in `dirmirror-sync`, not here.

use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

use crate::domain::errors::DomainError;

// ============================================================================
// MirrorRoot
// ============================================================================

/// Absolute path of a directory that takes part in the mirror
///
/// Only direct (flat) children of a root are ever addressed, see
/// [`MirrorRoot::join_name`] and [`MirrorRoot::child_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorRoot(PathBuf);

impl MirrorRoot {
    /// Create a new MirrorRoot, validating it is absolute
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is not absolute or
    /// escapes the filesystem root via `..`
    pub fn new(path: PathBuf) -> Result<Self, DomainError> {
        if !path.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Path must be absolute: {}",
                path.display()
            )));
        }

        let normalized = Self::normalize_path(&path)?;
        Ok(Self(normalized))
    }

    /// Get the inner path
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Path of the direct child `name` under this root
    ///
    /// # Errors
    /// Returns `DomainError::InvalidEntryName` if `name` is empty, is `.` or
    /// `..`, or contains a separator (i.e. would not be a flat child)
    pub fn join_name(&self, name: &OsStr) -> Result<PathBuf, DomainError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(c)), None) if c == name => Ok(self.0.join(name)),
            _ => Err(DomainError::InvalidEntryName(
                name.to_string_lossy().into_owned(),
            )),
        }
    }

    /// File name of `path` if it is a direct child of this root
    ///
    /// Returns `None` for the root itself, for nested descendants and for
    /// paths outside the root.
    pub fn child_name<'a>(&self, path: &'a Path) -> Option<&'a OsStr> {
        match path.parent() {
            Some(parent) if parent == self.0 => path.file_name(),
            _ => None,
        }
    }

    /// Normalize a path by resolving . and .. components
    fn normalize_path(path: &Path) -> Result<PathBuf, DomainError> {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::Prefix(p) => normalized.push(p.as_os_str()),
                Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(DomainError::InvalidPath(
                            "Path escapes root via ..".to_string(),
                        ));
                    }
                }
                Component::Normal(c) => normalized.push(c),
            }
        }

        Ok(normalized)
    }
}

impl Display for MirrorRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl TryFrom<PathBuf> for MirrorRoot {
    type Error = DomainError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl From<MirrorRoot> for PathBuf {
    fn from(root: MirrorRoot) -> Self {
        root.0
    }
}

impl AsRef<Path> for MirrorRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

// ============================================================================
// MirrorRoots
// ============================================================================

/// The resolved source and target directories of one mirror
///
/// Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRoots {
    /// Directory whose regular files are mirrored
    pub source: MirrorRoot,
    /// Directory that is made to match `source`
    pub target: MirrorRoot,
}

impl MirrorRoots {
    pub fn new(source: MirrorRoot, target: MirrorRoot) -> Self {
        Self { source, target }
    }

    /// Target path with the same file name as `name`
    pub fn target_path(&self, name: &OsStr) -> Result<PathBuf, DomainError> {
        self.target.join_name(name)
    }

    /// Source path with the same file name as `name`
    pub fn source_path(&self, name: &OsStr) -> Result<PathBuf, DomainError> {
        self.source.join_name(name)
    }
}
