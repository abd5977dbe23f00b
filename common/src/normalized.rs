//! The normalized tuple the Normalizer hands off to the Persister. Lives in
//! `common` (rather than in `pipeline`) so `mongodb_connector` can accept it
//! without depending back on the pipeline crate.

use crate::entities::{Article, Brand, Color, Item};

/// An `ArticleHistory` row without a surrogate id yet; the persister
/// assigns one at insert time.
#[derive(Debug, Clone)]
pub struct HistoryDraft {
    pub article_id: i64,
    pub timestamp: u64,
    pub price_full: Option<u64>,
    pub price_with_discount: Option<u64>,
    pub sale: Option<f64>,
    pub rating: f64,
    pub feedbacks: u64,
    pub sum_count: u64,
}

#[derive(Debug, Clone)]
pub struct NormalizedCard {
    pub brand: Brand,
    pub item: Item,
    pub article: Article,
    pub colors: Vec<Color>,
    pub history: HistoryDraft,
    /// `(size name, total qty in stock)`, deduplicated by name.
    pub sizes: Vec<(String, u64)>,
}
