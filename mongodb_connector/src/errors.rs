use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database operation failed")]
    Mongo(#[from] mongodb::error::Error),
    #[error("transaction for article {article_id} was aborted: {reason}")]
    TransactionAborted { article_id: i64, reason: String },
}
