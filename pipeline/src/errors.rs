use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Crawler(#[from] crawler::errors::CrawlerError),
    #[error("upstream returned a structurally empty or malformed document at {url}")]
    EmptyResponse { url: String },
    #[error("card {id} failed validation: {reason}")]
    CardValidation { id: i64, reason: String },
    #[error("category {id} failed validation: {reason}")]
    CategoryValidation { id: i64, reason: String },
    #[error(transparent)]
    Persistence(#[from] mongodb_connector::errors::PersistenceError),
}
