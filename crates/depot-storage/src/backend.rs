use crate::{Object, Result};

/// Abstract storage capability consumed by the synchronizer.
///
/// Exactly two operations are required: enumerating the store and fetching a
/// single object's content. Both may be slow and may fail; implementations do
/// not retry, and the caller treats failures as fatal for the regeneration
/// attempt in flight.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Lists every object currently in the store.
    async fn list_objects(&self) -> Result<Vec<Object>>;

    /// Fetches the full content of the object at `path`.
    async fn get_object(&self, path: &str) -> Result<Vec<u8>>;
}
