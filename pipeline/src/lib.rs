pub mod card_fetcher;
pub mod category_loader;
pub mod constants;
pub mod enumerator;
pub mod errors;
pub mod normalizer;
pub mod persister;
pub mod records;
pub mod supervisor;

pub use errors::PipelineError;
pub use supervisor::{PipelineConfig, run_crawl};
