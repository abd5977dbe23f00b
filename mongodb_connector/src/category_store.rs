use common::entities::Category;
use mongodb::{Collection, Database, bson::doc};
use tracing::info;

use crate::errors::PersistenceError;

const COLLECTION_CATEGORIES_NAME: &str = "categories";

/// Owns the Category collection. Categories are bootstrapped wholesale by
/// the category loader and read read-only by everything downstream.
pub struct CategoryStore {
    collection: Collection<Category>,
}

impl CategoryStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Category>(COLLECTION_CATEGORIES_NAME),
        }
    }

    /// Truncates the collection and bulk-inserts `categories`, matching the
    /// loader's "truncate and replace" bootstrap semantics.
    pub async fn replace_all(&self, categories: Vec<Category>) -> Result<(), PersistenceError> {
        self.collection.delete_many(doc! {}).await?;

        if categories.is_empty() {
            return Ok(());
        }

        let inserted = categories.len();
        self.collection.insert_many(categories).await?;
        info!(inserted, "replaced category tree");

        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<Category>, PersistenceError> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut categories = Vec::new();

        while cursor.advance().await? {
            categories.push(cursor.deserialize_current()?);
        }

        Ok(categories)
    }
}
