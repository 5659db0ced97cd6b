use depot_repo::RepoError;
use depot_storage::StorageError;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced to `Synchronizer::sync` callers.
///
/// Every variant is fatal to the regeneration attempt that produced it and
/// implies the published index and snapshot were left at their last good
/// state. `RepoError::InvalidArtifact` never reaches this type: the resolver
/// boundary downgrades it to a logged skip.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}
