//! HTTP client for the eco-routing service.

use anyhow::{Context, Result};
use eco_core::{RoutingRequest, RoutingResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Error body returned for rejected requests.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
    #[serde(default)]
    hint: Option<String>,
}

pub struct EcoClient {
    base_url: String,
    client: reqwest::Client,
}

impl EcoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Request ranked routes for `request`.
    pub async fn route(&self, request: &RoutingRequest) -> Result<RoutingResponse> {
        let url = format!("{}/routing/eco", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;
        read_body(response).await
    }

    pub async fn config(&self) -> Result<Value> {
        self.get_json("/routing/config").await
    }

    pub async fn health(&self) -> Result<Value> {
        self.get_json("/routing/health").await
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        read_body(response).await
    }
}

async fn read_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        match serde_json::from_str::<ApiError>(&body) {
            Ok(ApiError {
                error,
                hint: Some(hint),
            }) => anyhow::bail!("{} ({}): {}", error, hint, status),
            Ok(ApiError { error, hint: None }) => anyhow::bail!("{}: {}", error, status),
            Err(_) => anyhow::bail!("request failed: {} {}", status, body.trim()),
        }
    }
    serde_json::from_str(&body).context("decoding response")
}
