//! End-to-end synchronizer tests against the in-memory backend.
//!
//! Packages are small JSON documents (`{"name": ..., "version": ...}`) so the
//! tests control exactly which objects parse and which count as invalid.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depot_repo::{ArtifactParser, ArtifactVersion, RepoError};
use depot_storage::{MemoryBackend, Object, StorageBackend, StorageError};
use depot_sync::{SyncError, Synchronizer, SynchronizerOptions};

struct JsonParser;

impl ArtifactParser for JsonParser {
    fn parse(&self, content: &[u8]) -> depot_repo::Result<ArtifactVersion> {
        let value: serde_json::Value =
            serde_json::from_slice(content).map_err(|_| RepoError::InvalidArtifact)?;
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(RepoError::InvalidArtifact)?;
        let version = value
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or(RepoError::InvalidArtifact)?;
        let mut artifact = ArtifactVersion::new(name, version);
        artifact.description = value
            .get("description")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(artifact)
    }
}

fn package(name: &str, version: &str) -> Vec<u8> {
    serde_json::json!({ "name": name, "version": version })
        .to_string()
        .into_bytes()
}

fn package_with_description(name: &str, version: &str, description: &str) -> Vec<u8> {
    serde_json::json!({ "name": name, "version": version, "description": description })
        .to_string()
        .into_bytes()
}

fn synchronizer(backend: Arc<MemoryBackend>) -> Synchronizer {
    Synchronizer::new(backend, Arc::new(JsonParser), SynchronizerOptions::default()).unwrap()
}

#[tokio::test]
async fn added_package_is_fetched_and_indexed() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    let sync = synchronizer(Arc::clone(&backend));

    sync.sync().await.unwrap();
    assert!(sync.index().index.get("a", "1.0.0").is_some());
    assert_eq!(backend.get_call_count(), 1);

    backend.insert("b-2.0.0.tgz", package("b", "2.0.0"));
    sync.sync().await.unwrap();

    let published = sync.index();
    assert!(published.index.get("a", "1.0.0").is_some());
    assert!(published.index.get("b", "2.0.0").is_some());
    // Only the new package was fetched on the second pass.
    assert_eq!(backend.get_call_count(), 2);
}

#[tokio::test]
async fn unchanged_listing_skips_the_rebuild() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    let sync = synchronizer(Arc::clone(&backend));

    sync.sync().await.unwrap();
    let first = sync.index();
    let fetches = backend.get_call_count();

    sync.sync().await.unwrap();
    let second = sync.index();

    assert!(Arc::ptr_eq(&first, &second), "skip must not republish");
    assert_eq!(backend.get_call_count(), fetches, "skip must not fetch");
}

#[tokio::test]
async fn removed_package_drops_without_fetching() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    backend.insert("c-3.0.0.tgz", package("c", "3.0.0"));
    let sync = synchronizer(Arc::clone(&backend));

    sync.sync().await.unwrap();
    assert!(sync.index().index.get("c", "3.0.0").is_some());
    let fetches = backend.get_call_count();

    backend.remove("c-3.0.0.tgz");
    sync.sync().await.unwrap();

    let published = sync.index();
    assert!(published.index.get("c", "3.0.0").is_none());
    assert!(published.index.get("a", "1.0.0").is_some());
    assert_eq!(backend.get_call_count(), fetches, "removal must not fetch");
}

#[tokio::test]
async fn updated_package_is_refetched() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    let sync = synchronizer(Arc::clone(&backend));

    sync.sync().await.unwrap();
    assert!(sync
        .index()
        .index
        .get("a", "1.0.0")
        .unwrap()
        .description
        .is_none());

    backend.insert(
        "a-1.0.0.tgz",
        package_with_description("a", "1.0.0", "republished"),
    );
    sync.sync().await.unwrap();

    let published = sync.index();
    assert_eq!(
        published.index.get("a", "1.0.0").unwrap().description.as_deref(),
        Some("republished")
    );
    assert_eq!(backend.get_call_count(), 2);
}

#[tokio::test]
async fn invalid_and_foreign_objects_are_ignored() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    backend.insert("broken-9.9.9.tgz", b"definitely not json".to_vec());
    backend.insert("README.md", b"not a package at all".to_vec());
    let sync = synchronizer(Arc::clone(&backend));

    sync.sync().await.unwrap();

    let published = sync.index();
    assert_eq!(published.index.entry_count(), 1);
    assert!(published.index.get("a", "1.0.0").is_some());
    // The README never matched the package extension, so it was not fetched.
    assert_eq!(backend.get_call_count(), 2);
}

#[tokio::test]
async fn fatal_fetch_error_publishes_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    for name in ["a", "b", "c", "d"] {
        backend.insert(format!("{name}-1.0.0.tgz"), package(name, "1.0.0"));
    }
    backend.fail_get("c-1.0.0.tgz");
    let sync = synchronizer(Arc::clone(&backend));
    let before = sync.index();

    let err = sync.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Storage(StorageError::Backend { .. })));

    let after = sync.index();
    assert!(
        Arc::ptr_eq(&before, &after),
        "failed regeneration must not publish"
    );
    assert!(after.index.is_empty(), "no successful task may leak through");

    // The snapshot was not advanced either: clearing the failure and
    // re-syncing picks every package up again.
    backend.clear_failing_gets();
    sync.sync().await.unwrap();
    let recovered = sync.index();
    assert_eq!(recovered.index.entry_count(), 4);
    for name in ["a", "b", "c", "d"] {
        assert!(recovered.index.get(name, "1.0.0").is_some());
    }
}

#[tokio::test]
async fn listing_failure_aborts_without_publishing() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    backend.fail_listing(true);
    let sync = synchronizer(Arc::clone(&backend));
    let before = sync.index();

    let err = sync.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
    assert!(Arc::ptr_eq(&before, &sync.index()));

    backend.fail_listing(false);
    sync.sync().await.unwrap();
    assert!(sync.index().index.get("a", "1.0.0").is_some());
}

#[tokio::test]
async fn base_url_is_stamped_into_the_document() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    let sync = Synchronizer::new(
        Arc::clone(&backend) as Arc<dyn StorageBackend>,
        Arc::new(JsonParser),
        SynchronizerOptions {
            base_url: "https://charts.example.com".to_string(),
        },
    )
    .unwrap();

    sync.sync().await.unwrap();
    let yaml = &sync.index().yaml;
    assert!(
        yaml.contains("- https://charts.example.com/charts/a-1.0.0.tgz"),
        "unexpected document:\n{yaml}"
    );
}

/// Backend wrapper that records how many listings run concurrently.
struct GaugeBackend {
    inner: Arc<MemoryBackend>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl GaugeBackend {
    fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for GaugeBackend {
    async fn list_objects(&self) -> depot_storage::Result<Vec<Object>> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = self.inner.list_objects().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_object(&self, path: &str) -> depot_storage::Result<Vec<u8>> {
        self.inner.get_object(path).await
    }
}

#[tokio::test]
async fn concurrent_sync_calls_never_overlap() {
    let memory = Arc::new(MemoryBackend::new());
    memory.insert("a-1.0.0.tgz", package("a", "1.0.0"));
    let backend = Arc::new(GaugeBackend::new(Arc::clone(&memory)));
    let sync = Arc::new(
        Synchronizer::new(
            Arc::clone(&backend) as Arc<dyn StorageBackend>,
            Arc::new(JsonParser),
            SynchronizerOptions::default(),
        )
        .unwrap(),
    );

    let first = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.sync().await }
    });
    let second = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.sync().await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(
        backend.max_active.load(Ordering::SeqCst),
        1,
        "regenerations overlapped"
    );
    assert!(sync.index().index.get("a", "1.0.0").is_some());
}
