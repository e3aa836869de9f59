//! Client for the hosted text-generation endpoint. The endpoint is opaque:
//! prompt in, generated string out, non-2xx is a failure.

use async_trait::async_trait;
use log::info;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation endpoint returned status {0}")]
    BadStatus(u16),
    #[error("generation endpoint reported an error: {0}")]
    Api(String),
    #[error("generation response carried no generated_text")]
    MalformedResponse,
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// Seam over the network call so the generation flow can run against a stub
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl InferenceClient {
    pub fn new(endpoint: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl TextGenerator for InferenceClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        info!("Requesting generation from {}", self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::BadStatus(status.as_u16()));
        }

        let body: Value = response.json().await?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(GenerateError::Api(message.to_string()));
        }

        // Success shape: a JSON array whose first element carries generated_text
        body.get(0)
            .and_then(|entry| entry.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(GenerateError::MalformedResponse)
    }
}
