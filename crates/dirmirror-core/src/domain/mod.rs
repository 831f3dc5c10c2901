//! Domain types for the mirror
//!
//! - Newtypes for validated mirror roots
//! - Change kinds delivered by the watcher
//! - Summary of a reconciliation pass
//! - Domain-specific error types

pub mod change;
pub mod errors;
pub mod newtypes;
pub mod summary;

pub use change::ChangeKind;
pub use errors::DomainError;
pub use newtypes::{MirrorRoot, MirrorRoots};
pub use summary::ReconcileSummary;
