use common::entities::{Article, ArticleHistory, Brand, Color, HistorySizeRelation, Item, Size};
use common::normalized::NormalizedCard;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::warn;

use crate::errors::PersistenceError;

const COLLECTION_BRANDS_NAME: &str = "brands";
const COLLECTION_COLORS_NAME: &str = "colors";
const COLLECTION_ITEMS_NAME: &str = "items";
const COLLECTION_ARTICLES_NAME: &str = "articles";
const COLLECTION_SIZES_NAME: &str = "sizes";
const COLLECTION_HISTORY_NAME: &str = "article_history";
const COLLECTION_HISTORY_SIZES_NAME: &str = "history_size_relations";

/// Owns every collection the ingestion pipeline writes to, and persists one
/// normalized card per call inside a multi-document transaction: reference
/// entities are get-or-inserted by identity, the history row is inserted and
/// flushed for its surrogate id, then its size relation rows are inserted.
/// The relational "insert only when absent, flush before referencing"
/// semantics are preserved even though the store underneath is a document
/// database: the whole card is one transaction, committed or rolled back as
/// a unit.
pub struct CatalogStore {
    client: Client,
    brands: Collection<Brand>,
    colors: Collection<Color>,
    items: Collection<Item>,
    articles: Collection<Article>,
    sizes: Collection<Size>,
    history: Collection<ArticleHistory>,
    history_sizes: Collection<HistorySizeRelation>,
}

impl CatalogStore {
    pub async fn new(db: &Database, client: Client) -> Result<Self, PersistenceError> {
        let sizes = db.collection::<Size>(COLLECTION_SIZES_NAME);

        sizes
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(
                        mongodb::options::IndexOptions::builder()
                            .unique(true)
                            .build(),
                    )
                    .build(),
            )
            .await?;

        Ok(Self {
            client,
            brands: db.collection(COLLECTION_BRANDS_NAME),
            colors: db.collection(COLLECTION_COLORS_NAME),
            items: db.collection(COLLECTION_ITEMS_NAME),
            articles: db.collection(COLLECTION_ARTICLES_NAME),
            sizes,
            history: db.collection(COLLECTION_HISTORY_NAME),
            history_sizes: db.collection(COLLECTION_HISTORY_SIZES_NAME),
        })
    }

    pub async fn persist_card(&self, card: &NormalizedCard) -> Result<(), PersistenceError> {
        // Sizes are get-or-inserted outside the transaction: a failed write
        // inside a Mongo transaction aborts it, so a duplicate-key recovery
        // read against `session` here would itself fail with a
        // transaction-aborted error instead of observing the raced row.
        let mut size_ids = Vec::with_capacity(card.sizes.len());

        for (name, count) in &card.sizes {
            let size_id = get_or_insert_size(&self.sizes, name).await?;
            size_ids.push((size_id, *count));
        }

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        if let Err(err) = self.persist_card_in(&mut session, card, &size_ids).await {
            session.abort_transaction().await?;
            return Err(PersistenceError::TransactionAborted {
                article_id: card.article.id,
                reason: err.to_string(),
            });
        }

        session.commit_transaction().await?;
        Ok(())
    }

    /// Returns up to `limit` `ArticleHistory` rows, unfiltered and in no
    /// particular order, for the read API's "no pagination" simplification.
    pub async fn recent_history(&self, limit: i64) -> Result<Vec<ArticleHistory>, PersistenceError> {
        let mut cursor = self
            .history
            .find(doc! {})
            .limit(limit)
            .await?;
        let mut rows = Vec::new();

        while cursor.advance().await? {
            rows.push(cursor.deserialize_current()?);
        }

        Ok(rows)
    }

    async fn persist_card_in(
        &self,
        session: &mut ClientSession,
        card: &NormalizedCard,
        size_ids: &[(ObjectId, u64)],
    ) -> Result<(), PersistenceError> {
        get_or_insert_by_id(&self.brands, session, card.brand.id, &card.brand).await?;
        get_or_insert_by_id(&self.items, session, card.item.id, &card.item).await?;

        for color in &card.colors {
            get_or_insert_by_id(&self.colors, session, color.id, color).await?;
        }

        get_or_insert_by_id(&self.articles, session, card.article.id, &card.article).await?;

        let history_id = ObjectId::new();
        let history_row = ArticleHistory {
            id: history_id,
            article_id: card.history.article_id,
            timestamp: card.history.timestamp,
            price_full: card.history.price_full,
            price_with_discount: card.history.price_with_discount,
            sale: card.history.sale,
            rating: card.history.rating,
            feedbacks: card.history.feedbacks,
            sum_count: card.history.sum_count,
        };
        self.history
            .insert_one(history_row)
            .session(&mut *session)
            .await?;

        let relations: Vec<HistorySizeRelation> = size_ids
            .iter()
            .map(|(size_id, count)| HistorySizeRelation {
                history_id,
                size_id: *size_id,
                count: *count,
            })
            .collect();

        if !relations.is_empty() {
            self.history_sizes
                .insert_many(relations)
                .session(&mut *session)
                .await?;
        }

        Ok(())
    }
}

async fn get_or_insert_by_id<T>(
    collection: &Collection<T>,
    session: &mut ClientSession,
    id: i64,
    value: &T,
) -> Result<(), PersistenceError>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + Clone,
{
    let existing = collection
        .find_one(doc! { "_id": id })
        .session(&mut *session)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    collection
        .insert_one(value.clone())
        .session(&mut *session)
        .await?;

    Ok(())
}

/// Get-or-inserts a `Size` by name. Runs outside any transaction: a write
/// conflict on the unique `name` index here is a plain duplicate-key error,
/// not a transaction-aborting one, so the follow-up `find_one` can safely
/// observe whichever concurrent persister won the race.
async fn get_or_insert_size(
    collection: &Collection<Size>,
    name: &str,
) -> Result<ObjectId, PersistenceError> {
    if let Some(existing) = collection.find_one(doc! { "name": name }).await? {
        return Ok(existing.id);
    }

    let size = Size {
        id: ObjectId::new(),
        name: name.to_string(),
    };

    if let Err(err) = collection.insert_one(size.clone()).await {
        // A concurrent persister may have raced us past the unique index;
        // treat that as a successful get rather than a failure.
        if let Some(existing) = collection.find_one(doc! { "name": name }).await? {
            warn!(name, "size name raced to existence by a concurrent persister");
            return Ok(existing.id);
        }

        return Err(err.into());
    }

    Ok(size.id)
}
