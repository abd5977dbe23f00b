pub use common::normalized::{HistoryDraft, NormalizedCard};
use serde::Deserialize;

/// One emission on the IDs queue: up to `MAX_ITEMS_IN_REQUEST` product ids
/// discovered for a single category.
#[derive(Debug, Clone)]
pub struct IdBatch {
    pub category_id: i64,
    pub ids: Vec<i64>,
}

impl IdBatch {
    /// Joins ids with `;`, the separator the card-detail endpoint expects.
    /// No leading or trailing separator, matching the "ID batching"
    /// testable property.
    pub fn joined_ids(&self) -> String {
        self.ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// One emission on the cards queue: the raw card-detail payload for every
/// id in one `IdBatch`.
#[derive(Debug, Clone)]
pub struct CardBatch {
    pub category_id: i64,
    pub products: Vec<RawProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub id: i64,
    pub root: i64,
    #[serde(rename = "brandId")]
    pub brand_id: i64,
    pub brand: String,
    pub name: String,
    #[serde(default)]
    pub sale: Option<f64>,
    #[serde(rename = "priceU", default)]
    pub price_u: Option<u64>,
    #[serde(rename = "salePriceU", default)]
    pub sale_price_u: Option<u64>,
    pub rating: f64,
    pub feedbacks: u64,
    #[serde(default)]
    pub colors: Vec<RawColor>,
    #[serde(default)]
    pub sizes: Vec<RawSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawColor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSize {
    pub name: String,
    #[serde(default)]
    pub stocks: Vec<RawStock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStock {
    #[serde(default)]
    pub qty: u64,
}

// `NormalizedCard` and `HistoryDraft` are defined in `common::normalized` so
// that `mongodb_connector` can accept them without depending on `pipeline`.
