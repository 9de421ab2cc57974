//! HTTP NER client
//!
//! Calls a token-classification endpoint that speaks the HuggingFace
//! inference protocol, asking for grouped entities
//! (`aggregation_strategy = "simple"`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ghg_core::{GhgError, NerConfig, Result};

use crate::{NerCapability, RawEntity};

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    inputs: &'a str,
    parameters: NerParameters,
}

#[derive(Debug, Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

#[derive(Debug, Deserialize)]
struct NerResponseEntity {
    #[serde(alias = "entity")]
    entity_group: String,
    word: String,
    score: Option<f32>,
    start: Option<usize>,
}

/// Parse a token-classification response body
///
/// Entities are returned in text order when offsets are present,
/// otherwise in response order.
pub fn parse_response(body: &str) -> Result<Vec<RawEntity>> {
    let mut entities: Vec<NerResponseEntity> = serde_json::from_str(body)
        .map_err(|e| GhgError::NerError(format!("Failed to parse response: {e}")))?;

    if entities.iter().all(|e| e.start.is_some()) {
        entities.sort_by_key(|e| e.start);
    }

    Ok(entities
        .into_iter()
        .map(|e| RawEntity {
            label: e.entity_group,
            text: e.word.trim().to_string(),
            score: e.score,
        })
        .collect())
}

/// Remote NER capability
pub struct HttpNer {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpNer {
    /// Create a client for a full model URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_token: None,
        }
    }

    /// Create from config (`{endpoint}/{model}`)
    pub fn from_config(config: &NerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GhgError::NerError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_token: config.api_token.clone(),
        })
    }

    /// Set the bearer token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NerCapability for HttpNer {
    async fn annotate(&self, sentence: &str) -> Result<Vec<RawEntity>> {
        let request = NerRequest {
            inputs: sentence,
            parameters: NerParameters {
                aggregation_strategy: "simple",
            },
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GhgError::NerError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GhgError::NerError(format!(
                "NER endpoint returned {status}: {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GhgError::NerError(format!("Failed to read response: {e}")))?;

        parse_response(&body)
    }
}
