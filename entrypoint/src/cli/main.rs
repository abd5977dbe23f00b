//! `crawler` binary: `start --categories` runs the bootstrap loader,
//! `start --items` runs the ingestion pipeline. Mirrors the teacher's
//! `indexer` binary's clap `Arguments` convention, trimmed to this domain's
//! two-mode bootstrap/pipeline split.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use common::config::SETTINGS;
use common::utils::get_current_time;
use crawler::fetcher::Fetcher;
use mongodb_connector::category_store::CategoryStore;
use mongodb_connector::catalog_store::CatalogStore;
use mongodb_connector::connector;
use pipeline::constants::WORKER_COUNT;
use pipeline::supervisor::{PipelineConfig, run_crawl};
use pipeline::{PipelineError, category_loader::load_categories};
use thiserror::Error;
use tracing::{error, info};
use utils::logger::configure_logger;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(version)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the category bootstrap loader and/or the ingestion pipeline.
    Start {
        /// Runs the category-tree bootstrap loader.
        #[arg(long)]
        categories: bool,
        /// Runs the product discovery and ingestion pipeline.
        #[arg(long)]
        items: bool,
        /// Runs the pipeline without persisting anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Persistence(#[from] mongodb_connector::errors::PersistenceError),
    #[error(transparent)]
    Crawler(#[from] crawler::errors::CrawlerError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[tokio::main]
async fn main() -> ExitCode {
    configure_logger();

    let args = Arguments::parse();

    let result = match args.command {
        Command::Start { categories, items, dry_run } => run(categories, items, dry_run).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "fatal error, exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(categories: bool, items: bool, dry_run: bool) -> Result<(), CliError> {
    let (client, db) = connector::connect().await?;
    let fetcher = Arc::new(Fetcher::new()?);
    let category_store = CategoryStore::new(&db);

    if categories {
        info!("running category bootstrap loader");
        load_categories(Arc::clone(&fetcher), &category_store).await?;
    }

    if items {
        info!(dry_run, "running ingestion pipeline");
        let catalog_store = Arc::new(CatalogStore::new(&db, client).await?);
        let all_categories = category_store.all().await?;

        let config = PipelineConfig {
            worker_count: WORKER_COUNT,
            persister_worker_count: SETTINGS.persister_worker_count,
            queue_capacity: SETTINGS.queue_capacity,
            crawl_timestamp: get_current_time(),
            dry_run,
        };

        run_crawl(all_categories, fetcher, catalog_store, config).await?;
    }

    Ok(())
}
