//! Repository index layer for Depot.
//!
//! This crate is responsible for:
//! - [`ArtifactVersion`]: the metadata record for one published artifact
//!   version, as produced by an [`ArtifactParser`].
//! - [`ArtifactId`]: the lightweight (name, version) identity derivable from a
//!   package path alone, so removals never need to download content.
//! - [`Index`]: the mutable (name, version) → metadata mapping and the
//!   `regenerate` step that renders it into the published YAML document.

mod artifact;
mod error;
mod index;
mod yaml;

pub use artifact::{ArtifactId, ArtifactParser, ArtifactVersion, ARTIFACT_PACKAGE_EXTENSION};
pub use error::{RepoError, Result};
pub use index::Index;
