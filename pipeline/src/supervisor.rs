//! Pipeline Supervisor: wires the four queues, spawns worker pools, and
//! detects completion or cancels everything on the first fatal error.

use std::sync::Arc;

use common::entities::Category;
use crawler::fetcher::Fetcher;
use metrics::{Metrics, put_metric};
use mongodb_connector::catalog_store::CatalogStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::card_fetcher::CardFetcher;
use crate::enumerator::Enumerator;
use crate::errors::PipelineError;
use crate::normalizer::Normalizer;
use crate::persister::Persister;
use crate::records::{CardBatch, IdBatch, NormalizedCard};

/// Everything the supervisor needs to run one crawl.
pub struct PipelineConfig {
    pub worker_count: usize,
    pub persister_worker_count: usize,
    pub queue_capacity: usize,
    pub crawl_timestamp: u64,
    pub dry_run: bool,
}

/// Runs one full crawl: enumerates every crawlable category, fetches and
/// normalizes every card, and persists a fresh history snapshot. Returns the
/// first fatal error encountered, if any; every worker is cancelled the
/// moment one occurs, and no partial transaction is left committed.
pub async fn run_crawl(
    categories: Vec<Category>,
    fetcher: Arc<Fetcher>,
    store: Arc<CatalogStore>,
    config: PipelineConfig,
) -> Result<(), PipelineError> {
    let token = CancellationToken::new();
    let crawlable: Vec<Category> = categories.into_iter().filter(Category::is_crawlable).collect();

    info!(count = crawlable.len(), "starting crawl over crawlable categories");

    let (categories_tx, categories_rx) = mpsc::channel::<Category>(config.queue_capacity.max(1));
    let (ids_tx, ids_rx) = mpsc::channel::<IdBatch>(config.queue_capacity);
    let (cards_tx, cards_rx) = mpsc::channel::<CardBatch>(config.queue_capacity);
    let (db_tx, db_rx) = mpsc::channel::<NormalizedCard>(config.queue_capacity);

    let mut handles: Vec<JoinHandle<Result<(), PipelineError>>> = Vec::new();

    // Feed categories from their own task: the enumerator pool below is the
    // consumer for this channel, and nothing drains it until `spawn_enumerators`
    // returns, so sending inline here would block on a full buffer before any
    // worker exists to empty it.
    tokio::spawn(async move {
        for category in crawlable {
            if categories_tx.send(category).await.is_err() {
                break;
            }
        }
    });

    handles.extend(spawn_enumerators(
        config.worker_count,
        categories_rx,
        ids_tx,
        Arc::clone(&fetcher),
        token.clone(),
    ));

    handles.extend(spawn_card_fetchers(
        config.worker_count,
        ids_rx,
        cards_tx,
        Arc::clone(&fetcher),
        token.clone(),
    ));

    handles.extend(spawn_normalizers(
        config.worker_count,
        cards_rx,
        db_tx,
        config.crawl_timestamp,
        token.clone(),
    ));

    handles.extend(spawn_persisters(
        config.persister_worker_count.max(1),
        db_rx,
        Arc::clone(&store),
        config.dry_run,
        token.clone(),
    ));

    let mut first_error = None;

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(%err, "worker reported a fatal error, cancelling crawl");
                put_metric!(Metrics::FatalAborts, 1);
                token.cancel();
                first_error.get_or_insert(err);
            }
            Err(join_err) => {
                error!(%join_err, "worker task panicked, cancelling crawl");
                put_metric!(Metrics::FatalAborts, 1);
                token.cancel();
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            info!("crawl completed, all queues drained");
            Ok(())
        }
    }
}

fn spawn_enumerators(
    worker_count: usize,
    categories_rx: mpsc::Receiver<Category>,
    ids_tx: mpsc::Sender<IdBatch>,
    fetcher: Arc<Fetcher>,
    token: CancellationToken,
) -> Vec<JoinHandle<Result<(), PipelineError>>> {
    let categories_rx = Arc::new(tokio::sync::Mutex::new(categories_rx));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let categories_rx = Arc::clone(&categories_rx);
        let ids_tx = ids_tx.clone();
        let enumerator = Enumerator::new(Arc::clone(&fetcher));
        let token = token.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let category = {
                    let mut rx = categories_rx.lock().await;

                    tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        category = rx.recv() => category,
                    }
                };

                let Some(category) = category else {
                    return Ok(());
                };

                enumerator.enumerate(&category, &ids_tx).await?;
            }
        }));
    }

    drop(ids_tx);
    handles
}

fn spawn_card_fetchers(
    worker_count: usize,
    ids_rx: mpsc::Receiver<IdBatch>,
    cards_tx: mpsc::Sender<CardBatch>,
    fetcher: Arc<Fetcher>,
    token: CancellationToken,
) -> Vec<JoinHandle<Result<(), PipelineError>>> {
    let ids_rx = Arc::new(tokio::sync::Mutex::new(ids_rx));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let ids_rx = Arc::clone(&ids_rx);
        let cards_tx = cards_tx.clone();
        let card_fetcher = CardFetcher::new(Arc::clone(&fetcher));
        let token = token.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let batch = {
                    let mut rx = ids_rx.lock().await;

                    tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        batch = rx.recv() => batch,
                    }
                };

                let Some(batch) = batch else {
                    return Ok(());
                };

                if let Some(cards) = card_fetcher.fetch(batch).await? {
                    if cards_tx.send(cards).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }));
    }

    drop(cards_tx);
    handles
}

fn spawn_normalizers(
    worker_count: usize,
    cards_rx: mpsc::Receiver<CardBatch>,
    db_tx: mpsc::Sender<NormalizedCard>,
    crawl_timestamp: u64,
    token: CancellationToken,
) -> Vec<JoinHandle<Result<(), PipelineError>>> {
    let cards_rx = Arc::new(tokio::sync::Mutex::new(cards_rx));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let cards_rx = Arc::clone(&cards_rx);
        let db_tx = db_tx.clone();
        let normalizer = Normalizer::new(crawl_timestamp);
        let token = token.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let batch = {
                    let mut rx = cards_rx.lock().await;

                    tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        batch = rx.recv() => batch,
                    }
                };

                let Some(batch) = batch else {
                    return Ok(());
                };

                for product in &batch.products {
                    let normalized = normalizer.normalize(batch.category_id, product)?;

                    if db_tx.send(normalized).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }));
    }

    drop(db_tx);
    handles
}

fn spawn_persisters(
    worker_count: usize,
    db_rx: mpsc::Receiver<NormalizedCard>,
    store: Arc<CatalogStore>,
    dry_run: bool,
    token: CancellationToken,
) -> Vec<JoinHandle<Result<(), PipelineError>>> {
    let db_rx = Arc::new(tokio::sync::Mutex::new(db_rx));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let db_rx = Arc::clone(&db_rx);
        let persister = Persister::new(Arc::clone(&store));
        let token = token.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let normalized = {
                    let mut rx = db_rx.lock().await;

                    tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        normalized = rx.recv() => normalized,
                    }
                };

                let Some(normalized) = normalized else {
                    return Ok(());
                };

                if dry_run {
                    continue;
                }

                if let Err(err) = persister.persist(&normalized).await {
                    warn!(article_id = normalized.article.id, %err, "persisting card failed");
                    return Err(err);
                }
            }
        }));
    }

    handles
}
