//! Storage-to-index synchronization engine for Depot.
//!
//! The [`Synchronizer`] keeps an in-memory repository index consistent with a
//! slowly-enumerable object store without re-downloading every package on
//! every refresh. One regeneration pass lists the store, diffs the listing
//! against the last-synchronized snapshot, resolves only the objects that
//! changed (added objects in parallel), rebuilds the index and atomically
//! publishes the new document together with the new snapshot.
//!
//! At most one regeneration is in flight process-wide; concurrent [`sync`]
//! callers block until the guard is free and never run overlapping passes.
//! A failed pass leaves the published index and the snapshot untouched.
//!
//! [`sync`]: Synchronizer::sync

mod coordinator;
mod error;
mod resolver;
mod synchronizer;

pub use error::{Result, SyncError};
pub use synchronizer::{PublishedIndex, Synchronizer, SynchronizerOptions};
