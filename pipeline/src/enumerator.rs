//! Identifier Enumerator: per-category product id discovery (steps A-D).

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;

use common::entities::Category;
use crawler::{fetcher::Fetcher, request::Request};
use metrics::{Metrics, put_metric};
use serde_json::Value;
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::constants::{
    BASE_URL, LAST_PAGE_TRESHOLD, MAX_BRANDS_IN_REQUEST, MAX_ITEMS_IN_BRANDS_FILTER,
    MAX_ITEMS_IN_REQUEST, MAX_PAGE, MIN_PRICE_RANGE, QUERY_PARAMS,
};
use crate::errors::PipelineError;
use crate::records::IdBatch;

const SORT_ORDERS: [&str; 3] = ["&sort=popular", "&sort=pricedown", "&sort=priceup"];

type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Discovers every product id in a category, working around the upstream
/// API's "first 100 pages" window by recursively partitioning on price and
/// brand before falling back to plain page traversal.
pub struct Enumerator {
    fetcher: Arc<Fetcher>,
}

impl Enumerator {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Entry point: enumerates `category` end to end, emitting `IdBatch`es
    /// on `sender` as they fill.
    pub async fn enumerate(
        &self,
        category: &Category,
        sender: &Sender<IdBatch>,
    ) -> Result<(), PipelineError> {
        let filters_url = format!(
            "{BASE_URL}{}/v4/filters?{}{QUERY_PARAMS}",
            category.shard_segment(),
            category.query_fragment()
        );
        let response = self.get(&filters_url).await?;
        let max_price = extract_max_price(&response, &filters_url)?;

        let result = self.basic_parsing(category, 0, max_price, sender).await;

        if result.is_ok() {
            put_metric!(Metrics::CategoriesEnumerated, 1, "category_id" => category.id.to_string());
        }

        result
    }

    async fn get(&self, url: &str) -> Result<Value, PipelineError> {
        let request = Request::builder().set_url(url).build();
        Ok(self.fetcher.fetch(request).await?)
    }

    /// Step B: recursively narrows `[min, max]` until the last-page probe
    /// returns few enough products to traverse directly, or until the range
    /// can no longer be split and brand partitioning takes over.
    fn basic_parsing<'a>(
        &'a self,
        category: &'a Category,
        min: u64,
        max: u64,
        sender: &'a Sender<IdBatch>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let price_lmt = format!("&priceU={min};{max}");
            let base_url = format!(
                "{BASE_URL}{}/catalog?{QUERY_PARAMS}&{}{price_lmt}",
                category.shard_segment(),
                category.query_fragment()
            );
            let last_page_url = format!("{base_url}&page={MAX_PAGE}");

            let response = self.get(&last_page_url).await?;
            let products = extract_products(&response, &last_page_url)?;

            if products.len() > LAST_PAGE_TRESHOLD {
                let mid = round_to_nearest_10_000((max + min) / 2 + 100);

                if mid.saturating_sub(min) >= MIN_PRICE_RANGE {
                    self.basic_parsing(category, min, mid, sender).await?;
                    self.basic_parsing(category, mid, max, sender).await?;
                } else {
                    self.parse_by_brand(category, &price_lmt, sender).await?;
                }
            } else {
                self.get_items_ids_chunk(category.id, &base_url, sender)
                    .await?;
            }

            Ok(())
        })
    }

    /// Step C: partitions the price range's brands into request-sized
    /// batches and runs Step D once per batch.
    async fn parse_by_brand(
        &self,
        category: &Category,
        price_lmt: &str,
        sender: &Sender<IdBatch>,
    ) -> Result<(), PipelineError> {
        let brand_filter_url = format!(
            "{BASE_URL}{}/v4/filters?filters=fbrand&{}{QUERY_PARAMS}{price_lmt}",
            category.shard_segment(),
            category.query_fragment()
        );
        let response = self.get(&brand_filter_url).await?;
        let brands = extract_brand_filters(&response, &brand_filter_url)?;

        for batch in partition_brands(&brands) {
            let ids = batch
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";");
            let base_url = format!(
                "{BASE_URL}{}/catalog?{QUERY_PARAMS}&{}{price_lmt}&fbrand={ids}",
                category.shard_segment(),
                category.query_fragment()
            );
            self.get_items_ids_chunk(category.id, &base_url, sender)
                .await?;
        }

        Ok(())
    }

    /// Step D: traverses pages under each sort order, unions the resulting
    /// ids, and emits them as `IdBatch`es of up to `MAX_ITEMS_IN_REQUEST`.
    async fn get_items_ids_chunk(
        &self,
        category_id: i64,
        base_url: &str,
        sender: &Sender<IdBatch>,
    ) -> Result<(), PipelineError> {
        let mut ids = HashSet::new();

        for sorting in SORT_ORDERS {
            ids.extend(self.traverse_pages(base_url, sorting).await?);
        }

        let mut buffer = Vec::with_capacity(MAX_ITEMS_IN_REQUEST);

        for id in ids {
            buffer.push(id);

            if buffer.len() == MAX_ITEMS_IN_REQUEST {
                let batch = std::mem::take(&mut buffer);
                send_batch(sender, category_id, batch).await?;
            }
        }

        if !buffer.is_empty() {
            send_batch(sender, category_id, buffer).await?;
        }

        Ok(())
    }

    async fn traverse_pages(
        &self,
        base_url: &str,
        sorting: &str,
    ) -> Result<HashSet<i64>, PipelineError> {
        let mut ids = HashSet::new();

        for page in 1..=MAX_PAGE {
            let url = format!("{base_url}{sorting}&page={page}");
            let response = self.get(&url).await?;
            let products = extract_products(&response, &url)?;

            if products.is_empty() {
                break;
            }

            for product in products {
                if let Some(id) = product.get("id").and_then(Value::as_i64) {
                    ids.insert(id);
                }
            }
        }

        Ok(ids)
    }
}

async fn send_batch(
    sender: &Sender<IdBatch>,
    category_id: i64,
    ids: Vec<i64>,
) -> Result<(), PipelineError> {
    debug!(category_id, batch_size = ids.len(), "emitting id batch");
    put_metric!(Metrics::IdBatchesEmitted, 1, "category_id" => category_id.to_string());

    if sender.send(IdBatch { category_id, ids }).await.is_err() {
        warn!(category_id, "id batch receiver dropped, discarding batch");
    }

    Ok(())
}

/// Matches Python's `round(value, -4)`: half-to-even, not half-up, so a
/// `value` landing exactly on an odd multiple of 5000 rounds toward the
/// nearest *even* multiple of 10000 rather than always up.
fn round_to_nearest_10_000(value: u64) -> u64 {
    let quotient = value / 10_000;
    let remainder = value % 10_000;

    match remainder.cmp(&5_000) {
        std::cmp::Ordering::Less => quotient * 10_000,
        std::cmp::Ordering::Greater => (quotient + 1) * 10_000,
        std::cmp::Ordering::Equal if quotient % 2 == 0 => quotient * 10_000,
        std::cmp::Ordering::Equal => (quotient + 1) * 10_000,
    }
}

/// Partitions brand ids into request batches of at most
/// `MAX_BRANDS_IN_REQUEST`, carving out any brand whose listing count
/// exceeds `MAX_ITEMS_IN_BRANDS_FILTER` into its own singleton batch.
fn partition_brands(brands: &[(i64, u64)]) -> Vec<Vec<i64>> {
    let mut batches = Vec::new();
    let mut small = Vec::new();

    for &(id, count) in brands {
        if count > MAX_ITEMS_IN_BRANDS_FILTER {
            batches.push(vec![id]);
        } else {
            small.push(id);
        }
    }

    for chunk in small.chunks(MAX_BRANDS_IN_REQUEST) {
        batches.push(chunk.to_vec());
    }

    batches
}

fn extract_max_price(response: &Value, url: &str) -> Result<u64, PipelineError> {
    response
        .pointer("/data/filters")
        .and_then(Value::as_array)
        .and_then(|filters| {
            filters
                .iter()
                .find(|filter| filter.get("key").and_then(Value::as_str) == Some("priceU"))
        })
        .and_then(|filter| filter.get("maxPriceU"))
        .and_then(Value::as_u64)
        .ok_or_else(|| PipelineError::EmptyResponse {
            url: url.to_string(),
        })
}

fn extract_products<'a>(response: &'a Value, url: &str) -> Result<&'a Vec<Value>, PipelineError> {
    response
        .pointer("/data/products")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::EmptyResponse {
            url: url.to_string(),
        })
}

fn extract_brand_filters(response: &Value, url: &str) -> Result<Vec<(i64, u64)>, PipelineError> {
    let items = response
        .pointer("/data/filters/0/items")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::EmptyResponse {
            url: url.to_string(),
        })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(Value::as_i64)?;
            let count = item.get("count").and_then(Value::as_u64).unwrap_or(0);
            Some((id, count))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_ten_thousand() {
        assert_eq!(round_to_nearest_10_000(50_100), 50_000);
        assert_eq!(round_to_nearest_10_000(47_600), 50_000);
        assert_eq!(round_to_nearest_10_000(4_999), 0);
    }

    #[test]
    fn ties_round_half_to_even() {
        assert_eq!(round_to_nearest_10_000(5_000), 0);
        assert_eq!(round_to_nearest_10_000(15_000), 20_000);
        assert_eq!(round_to_nearest_10_000(25_000), 20_000);
    }

    #[test]
    fn partitions_large_brand_alone_and_chunks_the_rest() {
        let mut brands = vec![(1, 600)];
        brands.extend((2..=25).map(|id| (id, 10)));

        let batches = partition_brands(&brands);

        assert_eq!(batches[0], vec![1]);
        assert_eq!(batches[1].len(), MAX_BRANDS_IN_REQUEST);
        assert_eq!(batches[2].len(), 4);
    }

    #[test]
    fn extracts_max_price_from_filter_list() {
        let response = serde_json::json!({
            "data": {
                "filters": [
                    {"key": "fbrand", "maxPriceU": 1},
                    {"key": "priceU", "maxPriceU": 1_234_500}
                ]
            }
        });

        assert_eq!(extract_max_price(&response, "u").unwrap(), 1_234_500);
    }

    #[test]
    fn missing_price_filter_is_empty_response() {
        let response = serde_json::json!({ "data": { "filters": [] } });
        assert!(matches!(
            extract_max_price(&response, "u"),
            Err(PipelineError::EmptyResponse { .. })
        ));
    }
}
