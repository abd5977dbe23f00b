use std::sync::Arc;
use std::time::Duration;

use common::config::SETTINGS;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{errors::CrawlerError, request::Request};

/// Attempts budget per request; on exhaustion the fetch fails fatally.
pub const ATTEMPTS_COUNTER: u32 = 10;
/// Process-wide cap on simultaneous in-flight requests.
pub const REQUEST_LIMIT: usize = 200;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Performs GETs against the marketplace through a single pooled client,
/// bounded by a process-wide concurrency gate and a growing-backoff retry
/// budget. One `Fetcher` is constructed per process and shared via `Arc`
/// across every pipeline stage.
pub struct Fetcher {
    client: Client,
    request_gate: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new() -> Result<Self, CrawlerError> {
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .gzip(true)
            .danger_accept_invalid_certs(SETTINGS.accept_invalid_certs);

        if let Some(timeout) = SETTINGS.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            request_gate: Arc::new(Semaphore::new(REQUEST_LIMIT)),
        })
    }

    /// GETs `request.url`, decoding the body as JSON. Retries up to
    /// `ATTEMPTS_COUNTER` times with backoff growing by one time unit per
    /// attempt, failing with `UpstreamUnavailable` once the budget is spent.
    pub async fn fetch(&self, request: Request) -> Result<Value, CrawlerError> {
        let _permit = self
            .request_gate
            .acquire()
            .await
            .expect("request gate semaphore is never closed");

        let mut attempts_remaining = ATTEMPTS_COUNTER;

        loop {
            match self.attempt(&request).await {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    attempts_remaining -= 1;

                    if attempts_remaining == 0 {
                        error!("attempts exhausted at: {}", request.url);
                        return Err(CrawlerError::UpstreamUnavailable {
                            url: request.url.clone(),
                        });
                    }

                    warn!(
                        "request at: {}, {attempts_remaining} tries left, {reason}",
                        request.url
                    );
                    sleep(Duration::from_secs(
                        (ATTEMPTS_COUNTER - attempts_remaining) as u64,
                    ))
                    .await;
                }
            }
        }
    }

    async fn attempt(&self, request: &Request) -> Result<Value, String> {
        let mut builder = self.client.get(&request.url);

        if let Some(headers) = &request.headers {
            for (key, value) in headers {
                builder = builder.header(key, value);
            }
        }

        info!("sending request to {}", request.url);

        let response = builder.send().await.map_err(|err| err.to_string())?;

        if !response.status().is_success() {
            return Err(format!("bad response status {}", response.status()));
        }

        response.json::<Value>().await.map_err(|err| err.to_string())
    }
}
