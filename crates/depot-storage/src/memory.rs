use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::{Object, Result, StorageBackend, StorageError};

/// In-memory [`StorageBackend`] used in tests and small embeddings.
///
/// Content is stored per path; every insert advances a logical clock that is
/// used as the object's modification time, so overwriting a path always
/// changes its marker. Failures can be injected per path to exercise the
/// synchronizer's abort paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    get_calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    failing_gets: Vec<String>,
    fail_listing: bool,
    clock: u64,
}

#[derive(Debug)]
struct StoredObject {
    content: Vec<u8>,
    last_modified: SystemTime,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` at `path`, overwriting any previous object.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let last_modified = SystemTime::UNIX_EPOCH + Duration::from_secs(inner.clock);
        inner.objects.insert(
            path.into(),
            StoredObject {
                content: content.into(),
                last_modified,
            },
        );
    }

    pub fn remove(&self, path: &str) {
        self.inner.lock().unwrap().objects.remove(path);
    }

    /// Makes subsequent `get_object` calls for `path` fail with a backend
    /// error. The object itself (if any) stays listed.
    pub fn fail_get(&self, path: impl Into<String>) {
        self.inner.lock().unwrap().failing_gets.push(path.into());
    }

    /// Clears every failure injected with [`MemoryBackend::fail_get`].
    pub fn clear_failing_gets(&self) {
        self.inner.lock().unwrap().failing_gets.clear();
    }

    /// Makes subsequent `list_objects` calls fail with a backend error.
    pub fn fail_listing(&self, fail: bool) {
        self.inner.lock().unwrap().fail_listing = fail;
    }

    /// Number of `get_object` calls served (including injected failures).
    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn list_objects(&self) -> Result<Vec<Object>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_listing {
            return Err(StorageError::backend("injected listing failure"));
        }
        Ok(inner
            .objects
            .iter()
            .map(|(path, stored)| {
                Object::new(
                    path.clone(),
                    stored.content.len() as u64,
                    Some(stored.last_modified),
                )
            })
            .collect())
    }

    async fn get_object(&self, path: &str) -> Result<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        if inner.failing_gets.iter().any(|p| p == path) {
            return Err(StorageError::backend(format!(
                "injected fetch failure for {path}"
            )));
        }
        match inner.objects.get(path) {
            Some(stored) => Ok(stored.content.clone()),
            None => Err(StorageError::ObjectNotFound {
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwriting_a_path_changes_its_marker() {
        let backend = MemoryBackend::new();
        backend.insert("a-1.0.0.tgz", b"one".to_vec());
        let before = backend.list_objects().await.unwrap();

        backend.insert("a-1.0.0.tgz", b"two".to_vec());
        let after = backend.list_objects().await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
        assert!(!before[0].same_content(&after[0]));
    }

    #[tokio::test]
    async fn get_object_reports_missing_paths() {
        let backend = MemoryBackend::new();
        let err = backend.get_object("missing.tgz").await.unwrap_err();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
        assert_eq!(backend.get_call_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_backend_errors() {
        let backend = MemoryBackend::new();
        backend.insert("a-1.0.0.tgz", b"content".to_vec());
        backend.fail_get("a-1.0.0.tgz");

        let err = backend.get_object("a-1.0.0.tgz").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));

        backend.fail_listing(true);
        assert!(backend.list_objects().await.is_err());
    }
}
