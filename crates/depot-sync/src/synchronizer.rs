use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info};

use depot_repo::{ArtifactParser, Index, ARTIFACT_PACKAGE_EXTENSION};
use depot_storage::{diff, Object, ObjectDiff, StorageBackend};

use crate::{coordinator, resolver, Result};

/// Options for constructing a [`Synchronizer`].
#[derive(Clone, Debug, Default)]
pub struct SynchronizerOptions {
    /// Public URL prefix stamped into the index's download links. Empty means
    /// relative links.
    pub base_url: String,
}

/// One atomically published generation of the repository index.
#[derive(Debug)]
pub struct PublishedIndex {
    /// The queryable entry mapping behind the document.
    pub index: Index,
    /// The rendered index document served to clients.
    pub yaml: String,
}

/// Keeps the published index consistent with the backing object store.
///
/// All shared mutable state lives behind two locks: the regeneration guard
/// (an async mutex held for the duration of an entire pass, listing and
/// fetching included) and the published generation (a cheap `RwLock` around
/// an `Arc` that is swapped exactly once per successful pass). Readers go
/// through [`Synchronizer::index`] and never block on a running rebuild.
pub struct Synchronizer {
    backend: Arc<dyn StorageBackend>,
    parser: Arc<dyn ArtifactParser>,
    state: Mutex<SyncState>,
    published: RwLock<Arc<PublishedIndex>>,
}

/// Baseline owned by the regeneration guard: the last-synchronized listing
/// and the entry mapping that produced the published document.
struct SyncState {
    snapshot: Vec<Object>,
    index: Index,
}

impl Synchronizer {
    /// Creates a synchronizer with an empty index and snapshot. The first
    /// [`Synchronizer::sync`] call populates both.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        parser: Arc<dyn ArtifactParser>,
        options: SynchronizerOptions,
    ) -> Result<Self> {
        let index = Index::new(options.base_url);
        let yaml = index.regenerate()?;
        Ok(Self {
            backend,
            parser,
            state: Mutex::new(SyncState {
                snapshot: Vec::new(),
                index: index.clone(),
            }),
            published: RwLock::new(Arc::new(PublishedIndex { index, yaml })),
        })
    }

    /// Returns the currently published index generation.
    pub fn index(&self) -> Arc<PublishedIndex> {
        self.published.read().unwrap().clone()
    }

    /// Synchronizes the index with the object store.
    ///
    /// Blocks while another regeneration is in flight; regenerations never
    /// overlap. If the fresh listing matches the snapshot the rebuild is
    /// skipped entirely. On any failure the published index and the snapshot
    /// are left at their last good state and the error is propagated.
    pub async fn sync(&self) -> Result<()> {
        debug!("acquiring regeneration guard");
        let mut state = self.state.lock().await;
        debug!("regeneration guard acquired");

        let (objects, diff) = self.list_and_diff(&state.snapshot).await?;
        if diff.is_empty() {
            debug!("storage listing unchanged, skipping regeneration");
            return Ok(());
        }
        self.rebuild(&mut state, objects, diff).await
    }

    /// Lists the store, keeps only artifact packages and diffs them against
    /// the snapshot.
    async fn list_and_diff(&self, snapshot: &[Object]) -> Result<(Vec<Object>, ObjectDiff)> {
        let all_objects = self.backend.list_objects().await?;
        let packages: Vec<Object> = all_objects
            .into_iter()
            .filter(|object| object.has_extension(ARTIFACT_PACKAGE_EXTENSION))
            .collect();
        let diff = diff(snapshot, &packages);
        Ok((packages, diff))
    }

    async fn rebuild(
        &self,
        state: &mut SyncState,
        objects: Vec<Object>,
        diff: ObjectDiff,
    ) -> Result<()> {
        info!(
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len(),
            "regenerating repository index"
        );

        let mut index = state.index.clone();

        for object in &diff.removed {
            self.remove_index_object(&mut index, object).await?;
        }
        for object in &diff.updated {
            self.update_index_object(&mut index, object).await?;
        }
        coordinator::add_objects(&mut index, &self.backend, &self.parser, diff.added).await?;

        debug!("rendering index document");
        let yaml = index.regenerate()?;

        *self.published.write().unwrap() = Arc::new(PublishedIndex {
            index: index.clone(),
            yaml,
        });
        state.index = index;
        state.snapshot = objects;

        info!(
            entries = state.index.entry_count(),
            "repository index regenerated"
        );
        Ok(())
    }

    /// Removals resolve identity from the path alone, so they never fetch.
    async fn remove_index_object(&self, index: &mut Index, object: &Object) -> Result<()> {
        let resolved =
            resolver::resolve_version(self.backend.as_ref(), self.parser.as_ref(), object, false)
                .await;
        let Some(version) = resolver::check_invalid(resolved, object, "removed")? else {
            return Ok(());
        };
        debug!(
            name = %version.name,
            version = %version.version,
            "removing artifact from index"
        );
        index.remove_entry(&version.id());
        Ok(())
    }

    async fn update_index_object(&self, index: &mut Index, object: &Object) -> Result<()> {
        let resolved =
            resolver::resolve_version(self.backend.as_ref(), self.parser.as_ref(), object, true)
                .await;
        let Some(version) = resolver::check_invalid(resolved, object, "updated")? else {
            return Ok(());
        };
        debug!(
            name = %version.name,
            version = %version.version,
            "updating artifact in index"
        );
        index.update_entry(version);
        Ok(())
    }
}
