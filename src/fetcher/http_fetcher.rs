use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{NotifierError, Result};
use crate::config::FetcherConfig;
use crate::domain::FetchedFeed;
use crate::fetcher::FeedFetcher;
use crate::normalizer::Normalizer;

pub struct HttpFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| NotifierError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            normalizer: Normalizer::new(),
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), url);

        self.normalizer.normalize(url, &body)
    }
}
