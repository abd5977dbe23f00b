//! Card Fetcher: turns ID batches into raw card-detail payloads.

use std::sync::Arc;

use crawler::{fetcher::Fetcher, request::Request};
use metrics::{Metrics, put_metric};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::card_url;
use crate::errors::PipelineError;
use crate::records::{CardBatch, IdBatch, RawProduct};

/// Consumes `IdBatch`es and emits `CardBatch`es. A structurally empty
/// response (no `data.products` at all) is logged and the batch is dropped
/// rather than escalated, mirroring a transient upstream hiccup; a product
/// that fails schema validation is a genuinely malformed card and is fatal
/// for the crawl, same as a retry-exhausted fetch.
pub struct CardFetcher {
    fetcher: Arc<Fetcher>,
}

impl CardFetcher {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn fetch(&self, batch: IdBatch) -> Result<Option<CardBatch>, PipelineError> {
        let url = card_url(&batch.joined_ids());
        let request = Request::builder().set_url(&url).build();
        let response = self.fetcher.fetch(request).await?;

        parse_cards(batch.category_id, &url, &response)
    }
}

/// Extracts and deserializes `data.products` out of a card-detail response.
/// Drops the whole batch only if the list itself is absent or empty; any
/// product present but failing to deserialize raises `CardValidation`.
/// Pure so it can be unit tested without a network round-trip.
fn parse_cards(
    category_id: i64,
    url: &str,
    response: &Value,
) -> Result<Option<CardBatch>, PipelineError> {
    let Some(products) = response.pointer("/data/products").and_then(Value::as_array) else {
        warn!(category_id, url, "card response has no product list, dropping batch");
        return Ok(None);
    };

    if products.is_empty() {
        debug!(category_id, url, "card batch yielded no products");
        return Ok(None);
    }

    let mut parsed = Vec::with_capacity(products.len());

    for raw in products {
        let product: RawProduct = serde_json::from_value(raw.clone()).map_err(|err| {
            let id = raw.get("id").and_then(Value::as_i64).unwrap_or(0);
            put_metric!(Metrics::ValidationFailures, 1, "stage" => "card_fetch");
            PipelineError::CardValidation {
                id,
                reason: err.to_string(),
            }
        })?;

        parsed.push(product);
    }

    put_metric!(Metrics::CardsFetched, parsed.len() as u64, "category_id" => category_id.to_string());

    Ok(Some(CardBatch {
        category_id,
        products: parsed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_product(id: i64) -> Value {
        json!({
            "id": id,
            "root": 10,
            "brandId": 20,
            "brand": "Acme",
            "name": "Wool sweater",
            "rating": 4.5,
            "feedbacks": 3,
            "colors": [],
            "sizes": []
        })
    }

    #[test]
    fn missing_product_list_drops_the_whole_batch() {
        let response = json!({ "data": {} });
        assert!(parse_cards(1, "u", &response).unwrap().is_none());
    }

    #[test]
    fn empty_product_list_drops_the_whole_batch() {
        let response = json!({ "data": { "products": [] } });
        assert!(parse_cards(1, "u", &response).unwrap().is_none());
    }

    #[test]
    fn well_formed_products_all_survive() {
        let response = json!({
            "data": {
                "products": [raw_product(1), raw_product(3)]
            }
        });

        let batch = parse_cards(1, "u", &response).unwrap().unwrap();
        let ids: Vec<i64> = batch.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn a_single_malformed_product_fails_the_whole_batch() {
        let response = json!({
            "data": {
                "products": [raw_product(1), { "id": 2 }, raw_product(3)]
            }
        });

        let result = parse_cards(1, "u", &response);
        assert!(matches!(result, Err(PipelineError::CardValidation { id: 2, .. })));
    }
}
