use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Sentinel `color_id` used when an article lists more than one color.
pub const MULTI_COLOR_SENTINEL: i64 = 999999;

/// A node of the upstream category tree, as bootstrapped by the category
/// loader and consumed read-only by the ingestion pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub url: String,
    pub shard: Option<String>,
    pub query: Option<String>,
}

impl Category {
    /// A category is crawlable iff its shard is non-empty and contains
    /// neither the `blackhole` nor the `preset` sentinel.
    pub fn is_crawlable(&self) -> bool {
        match &self.shard {
            Some(shard) if !shard.is_empty() => {
                !shard.contains("blackhole") && !shard.contains("preset")
            }
            _ => false,
        }
    }

    pub fn query_fragment(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    pub fn shard_segment(&self) -> &str {
        self.shard.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Color {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
}

/// A product group bundling articles of different colors under one "root" id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: i64,
    pub category_id: i64,
    pub brand_id: i64,
}

/// A sellable SKU.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: i64,
    pub item_id: i64,
    pub name: String,
    pub color_id: Option<i64>,
}

/// Identity by `name`; `id` is assigned on first sight.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Size {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

/// One price/stock snapshot of an article, taken at crawl time. Always
/// inserted, never updated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleHistory {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub article_id: i64,
    pub timestamp: u64,
    pub price_full: Option<u64>,
    pub price_with_discount: Option<u64>,
    pub sale: Option<f64>,
    pub rating: f64,
    pub feedbacks: u64,
    pub sum_count: u64,
}

/// Many-to-many join row between one history snapshot and the sizes
/// observed in stock at that snapshot.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistorySizeRelation {
    pub history_id: ObjectId,
    pub size_id: ObjectId,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(shard: Option<&str>) -> Category {
        Category {
            id: 1,
            name: "test".into(),
            parent_id: None,
            url: "/catalog/test".into(),
            shard: shard.map(Into::into),
            query: None,
        }
    }

    #[test]
    fn crawlable_requires_non_empty_shard() {
        assert!(!category(None).is_crawlable());
        assert!(!category(Some("")).is_crawlable());
    }

    #[test]
    fn blackhole_and_preset_sentinels_are_not_crawlable() {
        assert!(!category(Some("electronics/blackhole")).is_crawlable());
        assert!(!category(Some("women/preset/shoes")).is_crawlable());
    }

    #[test]
    fn ordinary_shard_is_crawlable() {
        assert!(category(Some("women/clothes")).is_crawlable());
    }
}
