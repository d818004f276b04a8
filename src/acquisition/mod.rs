//! Ordered fallback chain of acquisition strategies.
//!
//! The chain always runs in the same order: remote extraction service, direct
//! HTTP fetch, headless render. Strategies that are not configured are simply
//! absent from the chain.

mod direct;
mod remote;
mod render;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AcquisitionError, TrackerError};
use crate::models::Payload;
use crate::traits::{AcquisitionStrategy, Target};

pub use direct::DirectFetch;
pub use remote::RemoteExtraction;
pub use render::HeadlessRender;

pub type AcquisitionResult = Result<Payload, AcquisitionError>;

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Header set sent with direct page fetches.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers
}

/// Shared HTTP client with a hard per-request timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
}

pub struct StrategyChain {
    strategies: Vec<Arc<dyn AcquisitionStrategy>>,
}

impl StrategyChain {
    /// Strategies are tried in the order given.
    pub fn new(strategies: Vec<Arc<dyn AcquisitionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TrackerError> {
        let client = build_http_client(config.http_timeout_secs)?;
        let mut strategies: Vec<Arc<dyn AcquisitionStrategy>> = Vec::new();

        match &config.firecrawl_api_key {
            Some(key) => strategies.push(Arc::new(RemoteExtraction::new(
                client.clone(),
                &config.firecrawl_api_url,
                key,
            ))),
            None => warn!("FIRECRAWL_API_KEY not set - remote extraction disabled"),
        }

        strategies.push(Arc::new(DirectFetch::new(client.clone())));

        if let Some(endpoint) = &config.render_service_url {
            strategies.push(Arc::new(HeadlessRender::new(
                client,
                endpoint,
                config.render_service_token.clone(),
            )));
        }

        let chain = Self::new(strategies);
        info!("Acquisition chain: {}", chain.strategy_names().join(" -> "));
        Ok(chain)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First successful payload for `target`.
    pub async fn acquire(&self, target: &Target) -> AcquisitionResult {
        self.acquire_usable(target, Ok).await
    }

    /// Tries each strategy until one yields a payload that `usable` accepts.
    ///
    /// A payload rejected by `usable` counts as a failed attempt, so the next
    /// strategy gets its turn.
    pub async fn acquire_usable<T, F>(
        &self,
        target: &Target,
        mut usable: F,
    ) -> Result<T, AcquisitionError>
    where
        F: FnMut(Payload) -> Result<T, AcquisitionError> + Send,
        T: Send,
    {
        if self.strategies.is_empty() {
            return Err(AcquisitionError::NoStrategies);
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut reachable = false;

        for strategy in &self.strategies {
            debug!("Trying {} for {}", strategy.name(), target.url);

            match strategy.acquire(target).await.and_then(&mut usable) {
                Ok(value) => {
                    debug!("{} succeeded for {}", strategy.name(), target.url);
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", strategy.name(), target.url, e);
                    reachable |= matches!(e, AcquisitionError::Unusable { .. });
                    attempts.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        Err(AcquisitionError::Exhausted {
            url: target.url.clone(),
            attempts,
            reachable,
        })
    }
}
