//! Storage layer for Depot.
//!
//! This crate is responsible for:
//! - The [`Object`] descriptor: the identity + change marker of a stored artifact
//!   package, cheap enough to enumerate without downloading content.
//! - The [`StorageBackend`] capability consumed by the synchronizer. The trait is
//!   intentionally small so it can be implemented for different stores (local
//!   disk, S3-compatible, in-memory).
//! - The [`diff`] engine that turns two object listings into the minimal set of
//!   index mutations.

mod backend;
mod diff;
mod error;
mod memory;
mod object;

pub use backend::StorageBackend;
pub use diff::{diff, ObjectDiff};
pub use error::{Result, StorageError};
pub use memory::MemoryBackend;
pub use object::Object;
