//! Client for a Firecrawl-compatible content extraction API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AcquisitionError;
use crate::models::{Payload, RemotePage};
use crate::traits::{AcquisitionStrategy, Target, TargetKind};

const SERVICE: &str = "remote extraction";

const DETAIL_PROMPT: &str = "Extract the following smartphone information: name, brand, price, screen size, processor, RAM, storage, battery, camera details";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    json_options: Option<JsonOptions<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonOptions<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<RemotePage>,
    error: Option<String>,
}

pub struct RemoteExtraction {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RemoteExtraction {
    pub fn new(client: Client, api_url: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/v1/scrape", api_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request_for(target: &Target) -> ScrapeRequest<'_> {
        match target.kind {
            TargetKind::Listing => ScrapeRequest {
                url: &target.url,
                formats: &["markdown", "html", "links"],
                json_options: None,
            },
            TargetKind::Detail => ScrapeRequest {
                url: &target.url,
                formats: &["markdown", "json"],
                json_options: Some(JsonOptions {
                    prompt: DETAIL_PROMPT,
                }),
            },
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for RemoteExtraction {
    fn name(&self) -> &'static str {
        "remote-extraction"
    }

    async fn acquire(&self, target: &Target) -> Result<Payload, AcquisitionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&Self::request_for(target))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = response.text().await?;
        let parsed: ScrapeResponse =
            serde_json::from_str(&body).map_err(|e| AcquisitionError::Malformed {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        if !parsed.success {
            return Err(AcquisitionError::Malformed {
                service: SERVICE.to_string(),
                reason: parsed
                    .error
                    .unwrap_or_else(|| "request reported failure".to_string()),
            });
        }

        let page = parsed.data.ok_or_else(|| AcquisitionError::Malformed {
            service: SERVICE.to_string(),
            reason: "response carried no data".to_string(),
        })?;

        debug!(
            "Remote extraction returned {} links for {}",
            page.links.len(),
            target.url
        );
        Ok(Payload::Extracted(page))
    }
}
