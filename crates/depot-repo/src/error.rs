pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors produced by artifact parsing and index rendering.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The object's content is not a valid artifact package (unparseable or
    /// empty), or its path does not encode a (name, version) identity.
    ///
    /// This is the one non-fatal error in the system: the synchronizer skips
    /// the offending object instead of aborting the regeneration.
    #[error("invalid artifact package")]
    InvalidArtifact,

    /// Rendering the index document from a consistent entry mapping failed.
    #[error("failed to render index document: {message}")]
    Regeneration { message: String },
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Regeneration {
            message: err.to_string(),
        }
    }
}
