//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the mirror algorithms depend on; their
//! implementations live in `dirmirror-sync`.
//!
//! ## Ports Overview
//!
//! - [`ILocalFileSystem`] - Flat directory listing, stat, copy and delete
//! - [`IMirrorReporter`] - Narration of every operation and event

pub mod local_filesystem;
pub mod reporter;

pub use local_filesystem::{EntryState, ILocalFileSystem};
pub use reporter::IMirrorReporter;
