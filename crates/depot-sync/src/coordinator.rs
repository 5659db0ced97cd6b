use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use depot_repo::{ArtifactParser, ArtifactVersion, Index};
use depot_storage::{Object, StorageBackend};

use crate::{resolver, Result, SyncError};

enum FetchOutcome {
    Resolved(ArtifactVersion),
    /// Invalid package, already logged; the object is simply not indexed.
    Skipped,
    /// The task observed cancellation before starting its fetch.
    Cancelled,
    Failed(SyncError),
}

/// Resolves the `added` objects in parallel and applies the successes to
/// `index`.
///
/// One task is dispatched per object; each checks the shared cancellation
/// token before fetching, so a fatal error in any task stops the rest from
/// starting new work. Storage calls already in flight are not interrupted.
/// Exactly one outcome per dispatched task is drained even after a fatal
/// error — anything less would leak tasks blocked on the channel. The first
/// fatal error is returned once the drain completes; invalid packages are
/// skipped, and no ordering is guaranteed among additions (upserting by
/// (name, version) makes application commutative).
pub(crate) async fn add_objects(
    index: &mut Index,
    backend: &Arc<dyn StorageBackend>,
    parser: &Arc<dyn ArtifactParser>,
    added: Vec<Object>,
) -> Result<()> {
    let total = added.len();
    if total == 0 {
        return Ok(());
    }
    debug!(
        total,
        "loading artifact packages from storage (this could take a while)"
    );

    let (outcome_tx, mut outcome_rx) = mpsc::channel(total);
    let cancel = CancellationToken::new();

    for object in added {
        let outcome_tx = outcome_tx.clone();
        let cancel = cancel.clone();
        let backend = Arc::clone(backend);
        let parser = Arc::clone(parser);
        tokio::spawn(async move {
            let outcome = if cancel.is_cancelled() {
                FetchOutcome::Cancelled
            } else {
                let resolved =
                    resolver::resolve_version(backend.as_ref(), parser.as_ref(), &object, true)
                        .await;
                match resolver::check_invalid(resolved, &object, "added") {
                    Ok(Some(version)) => FetchOutcome::Resolved(version),
                    Ok(None) => FetchOutcome::Skipped,
                    Err(err) => {
                        cancel.cancel();
                        FetchOutcome::Failed(err)
                    }
                }
            };
            // The receiver outlives every sender; a send can only fail if the
            // coordinator itself is being dropped, at which point the outcome
            // has nowhere to go anyway.
            let _ = outcome_tx.send(outcome).await;
        });
    }
    drop(outcome_tx);

    let mut first_error = None;
    while let Some(outcome) = outcome_rx.recv().await {
        match outcome {
            FetchOutcome::Resolved(version) if first_error.is_none() => {
                debug!(
                    name = %version.name,
                    version = %version.version,
                    "adding artifact to index"
                );
                index.add_entry(version);
            }
            FetchOutcome::Resolved(_) | FetchOutcome::Skipped | FetchOutcome::Cancelled => {}
            FetchOutcome::Failed(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
