use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("failed to build HTTP client")]
    ClientBuildFailed(#[from] reqwest::Error),
    #[error("request to {url} failed after exhausting the retry budget")]
    UpstreamUnavailable { url: String },
}
