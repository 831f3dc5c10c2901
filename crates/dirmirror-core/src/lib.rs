//! dirmirror Core - Domain types and port definitions
//!
//! This crate contains the I/O-free core of the mirror:
//! - **Domain types** - `MirrorRoot`, `MirrorRoots`, `ChangeKind`, `ReconcileSummary`
//! - **Port definitions** - Traits for adapters: `ILocalFileSystem`, `IMirrorReporter`
//! - **Configuration** - YAML-backed settings with validation
//!
//! # Architecture
//!
//! Follows the ports & adapters pattern. The domain module holds plain
//! data types with no filesystem access. Ports define the trait interfaces
//! that `dirmirror-sync` implements.

pub mod config;
pub mod domain;
pub mod ports;
