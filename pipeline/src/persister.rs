//! Persister: writes one normalized card into the catalog store per crawl.

use std::sync::Arc;

use metrics::{Metrics, put_metric};
use mongodb_connector::catalog_store::CatalogStore;

use crate::errors::PipelineError;
use crate::records::NormalizedCard;

/// Thin wrapper around `CatalogStore::persist_card`; every call opens and
/// commits its own transaction, so persisters can run concurrently.
pub struct Persister {
    store: Arc<CatalogStore>,
}

impl Persister {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn persist(&self, card: &NormalizedCard) -> Result<(), PipelineError> {
        self.store.persist_card(card).await?;
        put_metric!(Metrics::CardsPersisted, 1, "article_id" => card.article.id.to_string());
        Ok(())
    }
}
