use async_trait::async_trait;
use reqwest::Client;

use super::browser_headers;
use crate::error::AcquisitionError;
use crate::models::Payload;
use crate::traits::{AcquisitionStrategy, Target};

/// Plain HTTP GET of the target page.
pub struct DirectFetch {
    client: Client,
}

impl DirectFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AcquisitionStrategy for DirectFetch {
    fn name(&self) -> &'static str {
        "direct-fetch"
    }

    async fn acquire(&self, target: &Target) -> Result<Payload, AcquisitionError> {
        let response = self
            .client
            .get(&target.url)
            .headers(browser_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AcquisitionError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: target.url.clone(),
            });
        }

        let html = response.text().await?;
        if html.trim().is_empty() {
            return Err(AcquisitionError::unusable(&target.url, "empty document"));
        }

        Ok(Payload::Document {
            url: target.url.clone(),
            html,
        })
    }
}
