//! Normalizer: raw card payloads to the normalized entity tuple.

use common::entities::{Article, Brand, Color, Item, MULTI_COLOR_SENTINEL};
use std::collections::HashMap;

use crate::errors::PipelineError;
use crate::records::{HistoryDraft, NormalizedCard, RawProduct};

pub struct Normalizer {
    crawl_timestamp: u64,
}

impl Normalizer {
    pub fn new(crawl_timestamp: u64) -> Self {
        Self { crawl_timestamp }
    }

    /// Validates `product` against the card schema, then builds the
    /// normalized tuple. A validation failure is fatal for the crawl.
    pub fn normalize(
        &self,
        category_id: i64,
        product: &RawProduct,
    ) -> Result<NormalizedCard, PipelineError> {
        validate(product)?;

        let brand = Brand {
            id: product.brand_id,
            name: product.brand.clone(),
        };

        let item = Item {
            id: product.root,
            category_id,
            brand_id: product.brand_id,
        };

        let colors: Vec<Color> = product
            .colors
            .iter()
            .map(|c| Color {
                id: c.id,
                name: c.name.clone(),
            })
            .collect();

        let color_id = match colors.len() {
            0 => None,
            1 => Some(colors[0].id),
            _ => Some(MULTI_COLOR_SENTINEL),
        };

        let article = Article {
            id: product.id,
            item_id: product.root,
            name: product.name.clone(),
            color_id,
        };

        let mut sizes: HashMap<String, u64> = HashMap::new();
        for size in &product.sizes {
            let total: u64 = size.stocks.iter().map(|s| s.qty).sum();
            *sizes.entry(size.name.clone()).or_insert(0) += total;
        }

        let sum_count: u64 = sizes.values().sum();

        let history = HistoryDraft {
            article_id: product.id,
            timestamp: self.crawl_timestamp,
            price_full: product.price_u,
            price_with_discount: product.sale_price_u,
            sale: product.sale,
            rating: product.rating,
            feedbacks: product.feedbacks,
            sum_count,
        };

        Ok(NormalizedCard {
            brand,
            item,
            article,
            colors,
            history,
            sizes: sizes.into_iter().collect(),
        })
    }
}

fn validate(product: &RawProduct) -> Result<(), PipelineError> {
    if product.name.trim().is_empty() {
        return Err(PipelineError::CardValidation {
            id: product.id,
            reason: "name is empty".to_string(),
        });
    }

    if product.id <= 0 || product.root <= 0 || product.brand_id <= 0 {
        return Err(PipelineError::CardValidation {
            id: product.id,
            reason: "id, root or brandId is not a positive identifier".to_string(),
        });
    }

    if !product.rating.is_finite() || product.rating < 0.0 {
        return Err(PipelineError::CardValidation {
            id: product.id,
            reason: "rating is not a finite non-negative number".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RawColor, RawSize, RawStock};

    fn base_product() -> RawProduct {
        RawProduct {
            id: 1,
            root: 10,
            brand_id: 20,
            brand: "Acme".to_string(),
            name: "Wool sweater".to_string(),
            sale: Some(0.2),
            price_u: Some(100_000),
            sale_price_u: Some(80_000),
            rating: 4.5,
            feedbacks: 12,
            colors: vec![],
            sizes: vec![],
        }
    }

    #[test]
    fn single_color_keeps_its_own_id() {
        let mut product = base_product();
        product.colors = vec![RawColor { id: 5, name: "red".to_string() }];

        let normalized = Normalizer::new(1_700_000_000).normalize(1, &product).unwrap();

        assert_eq!(normalized.article.color_id, Some(5));
        assert_eq!(normalized.colors.len(), 1);
    }

    #[test]
    fn multi_color_uses_sentinel() {
        let mut product = base_product();
        product.colors = vec![
            RawColor { id: 5, name: "red".to_string() },
            RawColor { id: 7, name: "blue".to_string() },
        ];

        let normalized = Normalizer::new(1_700_000_000).normalize(1, &product).unwrap();

        assert_eq!(normalized.article.color_id, Some(MULTI_COLOR_SENTINEL));
        assert_eq!(normalized.colors.len(), 2);
    }

    #[test]
    fn no_colors_leaves_color_id_absent() {
        let product = base_product();
        let normalized = Normalizer::new(1_700_000_000).normalize(1, &product).unwrap();
        assert_eq!(normalized.article.color_id, None);
    }

    #[test]
    fn sum_count_matches_size_relation_total() {
        let mut product = base_product();
        product.sizes = vec![
            RawSize {
                name: "M".to_string(),
                stocks: vec![RawStock { qty: 3 }, RawStock { qty: 2 }],
            },
            RawSize {
                name: "L".to_string(),
                stocks: vec![RawStock { qty: 1 }],
            },
        ];

        let normalized = Normalizer::new(1_700_000_000).normalize(1, &product).unwrap();

        let relation_total: u64 = normalized.sizes.iter().map(|(_, count)| *count).sum();
        assert_eq!(normalized.history.sum_count, relation_total);
        assert_eq!(normalized.history.sum_count, 6);
    }

    #[test]
    fn empty_name_fails_validation() {
        let mut product = base_product();
        product.name = "   ".to_string();

        let result = Normalizer::new(1).normalize(1, &product);
        assert!(matches!(result, Err(PipelineError::CardValidation { .. })));
    }
}
