use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::AcquisitionError;
use crate::models::Payload;
use crate::traits::{AcquisitionStrategy, Target};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
}

/// Fetches JavaScript-rendered HTML from a headless browser service that
/// follows the browserless `/content` contract: POST `{url}`, receive HTML.
pub struct HeadlessRender {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HeadlessRender {
    pub fn new(client: Client, endpoint: &str, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            token,
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for HeadlessRender {
    fn name(&self) -> &'static str {
        "headless-render"
    }

    async fn acquire(&self, target: &Target) -> Result<Payload, AcquisitionError> {
        let mut request = self.client.post(&self.endpoint).json(&RenderRequest {
            url: &target.url,
            goto_options: GotoOptions {
                wait_until: "networkidle2",
            },
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AcquisitionError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let html = response.text().await?;
        if html.trim().is_empty() {
            return Err(AcquisitionError::unusable(&target.url, "renderer returned no content"));
        }

        Ok(Payload::Document {
            url: target.url.clone(),
            html,
        })
    }
}
