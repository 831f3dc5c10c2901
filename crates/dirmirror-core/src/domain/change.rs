//! Kinds of change notifications delivered for the source directory

use std::fmt;

/// What happened to an entry directly inside the watched directory
///
/// `Overflow` carries no entry: it signals that the notification backend
/// dropped one or more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An entry appeared
    Create,
    /// An entry's content or metadata changed
    Modify,
    /// An entry disappeared
    Delete,
    /// Events were lost; the target may have drifted
    Overflow,
}

impl ChangeKind {
    /// Returns the name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "ENTRY_CREATE",
            ChangeKind::Modify => "ENTRY_MODIFY",
            ChangeKind::Delete => "ENTRY_DELETE",
            ChangeKind::Overflow => "OVERFLOW",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
