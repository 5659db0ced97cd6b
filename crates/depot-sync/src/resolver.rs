use sha2::{Digest, Sha256};
use tracing::warn;

use depot_repo::{ArtifactId, ArtifactParser, ArtifactVersion, RepoError};
use depot_storage::{Object, StorageBackend};

use crate::{Result, SyncError};

/// Resolves a stored object into artifact metadata.
///
/// With `fetch_content = false` the identity is derived from the object's
/// path alone, with no storage I/O; that is all a removal needs. With
/// `fetch_content = true` the content is fetched through the backend, empty
/// content is rejected as invalid, and parsing is delegated to `parser`. A
/// content digest is stamped when the parser did not supply one.
pub(crate) async fn resolve_version(
    backend: &dyn StorageBackend,
    parser: &dyn ArtifactParser,
    object: &Object,
    fetch_content: bool,
) -> Result<ArtifactVersion> {
    if !fetch_content {
        let id = ArtifactId::from_path(object.path()).ok_or(RepoError::InvalidArtifact)?;
        return Ok(ArtifactVersion::new(id.name, id.version));
    }

    let content = backend.get_object(object.path()).await?;
    if content.is_empty() {
        return Err(RepoError::InvalidArtifact.into());
    }
    let mut version = parser.parse(&content).map_err(SyncError::Repo)?;
    if version.digest.is_none() {
        version.digest = Some(hex::encode(Sha256::digest(&content)));
    }
    Ok(version)
}

/// Downgrades `InvalidArtifact` to a logged skip (`Ok(None)`); every other
/// error stays fatal. `action` names the diff category for the log line.
pub(crate) fn check_invalid(
    result: Result<ArtifactVersion>,
    object: &Object,
    action: &str,
) -> Result<Option<ArtifactVersion>> {
    match result {
        Ok(version) => Ok(Some(version)),
        Err(SyncError::Repo(RepoError::InvalidArtifact)) => {
            warn!(action, package = object.path(), "invalid package in storage");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
