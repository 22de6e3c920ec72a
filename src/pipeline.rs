//! Bulk ingest orchestration.
//!
//! Items are processed in consecutive windows. Inside a window every item runs
//! its dedup lookup, validation and image downloads concurrently; once the whole
//! window has finished, the prepared cards are staged one by one in input order.
//! A commit is issued whenever the number of items processed since the last
//! commit reaches the threshold, and once more at the end. Any store failure
//! rolls back the open transaction and ends the run.

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::assets::{self, ImageSource};
use crate::config::IngestSettings;
use crate::db::NewCard;
use crate::error::{IngestError, Rejection};
use crate::model::{BatchRun, ItemOutcome, RunPhase, RunSummary};
use crate::scryfall::ScryfallClient;
use crate::store::CardStore;
use crate::transform;

/// Locate the configured bulk file, download it and ingest every card.
pub async fn run(
    settings: &IngestSettings,
    client: &ScryfallClient,
    store: &dyn CardStore,
    images: &dyn ImageSource,
) -> Result<RunSummary, IngestError> {
    info!(phase = RunPhase::Locating.as_str(), kind = %settings.bulk_type, "ingest run starting");
    let entry = client
        .locate_bulk(settings.bulk_type)
        .await
        .map_err(failed)?
        .ok_or(IngestError::BulkDataNotFound(settings.bulk_type))
        .map_err(failed)?;

    info!(phase = RunPhase::Downloading.as_str(), uri = %entry.download_uri, "downloading bulk data");
    let items = client
        .fetch_bulk(&entry.download_uri)
        .await
        .map_err(failed)?;

    ingest(settings, store, images, items).await
}

/// Ingest already-downloaded bulk entries.
#[instrument(skip_all, fields(total = items.len()))]
pub async fn ingest(
    settings: &IngestSettings,
    store: &dyn CardStore,
    images: &dyn ImageSource,
    items: Vec<Value>,
) -> Result<RunSummary, IngestError> {
    let mut run = BatchRun::new(items.len(), settings.window.max(1), settings.commit_every.max(1));
    let images = settings.download_images.then_some(images);
    info!(
        phase = RunPhase::Processing.as_str(),
        total = run.total,
        window = run.window,
        commit_every = run.commit_every,
        "processing bulk entries"
    );

    match process_windows(&mut run, store, images, items).await {
        Ok(()) => {
            let summary = RunSummary::from(&run);
            info!(
                phase = summary.phase.as_str(),
                processed = summary.processed,
                staged = summary.staged,
                already_stored = summary.already_stored,
                rejected = summary.rejected,
                commits = summary.commits,
                "ingest run finished"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(
                processed = run.processed,
                committed = run.committed_items,
                discarded = run.uncommitted,
                "rolling back uncommitted cards"
            );
            if let Err(rollback_err) = store.rollback().await {
                error!(?rollback_err, "rollback failed");
            }
            Err(failed(err))
        }
    }
}

async fn process_windows(
    run: &mut BatchRun,
    store: &dyn CardStore,
    images: Option<&dyn ImageSource>,
    items: Vec<Value>,
) -> Result<(), IngestError> {
    let mut items = items.into_iter();
    loop {
        let window: Vec<Value> = items.by_ref().take(run.window).collect();
        if window.is_empty() {
            break;
        }
        let size = window.len();

        let prepared = join_all(window.into_iter().map(|value| prepare(store, images, value)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        for item in prepared {
            match item {
                Prepared::Card(card) => {
                    store.stage(card).await.map_err(IngestError::Store)?;
                    run.record(ItemOutcome::Staged);
                }
                Prepared::Skipped(outcome) => run.record(outcome),
            }
        }

        if run.finish_window(size) {
            commit(run, store).await?;
        }
    }

    if run.has_uncommitted() {
        commit(run, store).await?;
    }
    Ok(())
}

async fn commit(run: &mut BatchRun, store: &dyn CardStore) -> Result<(), IngestError> {
    debug!(phase = RunPhase::Committing.as_str(), pending = run.uncommitted, "committing batch");
    store.commit().await.map_err(IngestError::Store)?;
    run.mark_committed();
    info!(
        processed = run.processed,
        total = run.total,
        staged = run.staged,
        already_stored = run.already_stored,
        rejected = run.rejected,
        commits = run.commits,
        "batch committed"
    );
    Ok(())
}

enum Prepared {
    Card(NewCard),
    Skipped(ItemOutcome),
}

/// Dedup, validate and download images for one bulk entry. Only store
/// failures are returned as errors.
async fn prepare(
    store: &dyn CardStore,
    images: Option<&dyn ImageSource>,
    value: Value,
) -> Result<Prepared, IngestError> {
    let raw = match transform::decode(value) {
        Ok(raw) => raw,
        Err(rejection) => return Ok(rejected(rejection)),
    };
    let scryfall_id = match raw.scryfall_id() {
        Ok(id) => id,
        Err(rejection) => return Ok(rejected(rejection)),
    };

    if store.exists(scryfall_id).await.map_err(IngestError::Store)? {
        debug!(scryfall_id, "card already stored; skipping");
        return Ok(Prepared::Skipped(ItemOutcome::AlreadyStored));
    }
    if let Err(rejection) = raw.validate() {
        return Ok(rejected(rejection));
    }

    let fetched = match images {
        Some(source) => Some(assets::fetch_images(source, scryfall_id, &raw.image_request()).await),
        None => None,
    };

    match transform::build(raw, fetched) {
        Ok(card) => Ok(Prepared::Card(card)),
        Err(rejection) => Ok(rejected(rejection)),
    }
}

fn rejected(rejection: Rejection) -> Prepared {
    warn!(%rejection, "skipping card");
    Prepared::Skipped(ItemOutcome::Rejected)
}

fn failed(err: IngestError) -> IngestError {
    error!(phase = RunPhase::Failed.as_str(), error = %err, "ingest run failed");
    err
}
