//! # Prediction Adapter
//!
//! Create/poll client for a Replicate-style asynchronous prediction API. A
//! job is submitted against `{base}/models/{model}/predictions` and then
//! observed through the `urls.get` link the provider hands back.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response};
use tracing::{debug, warn};

use crate::{
    adapters::{base::AdapterUtils, PredictionUpstream},
    error::RelayError,
    schemas::{ImageJobRequest, PredictionJob, PredictionResponse},
};

pub const IMAGE_AUTH_MESSAGE: &str = "Image generation failed. Check your Replicate API key in Settings.";
pub const CREATE_DEFAULT_ERROR: &str = "Failed to generate image";
pub const MISSING_POLL_URL: &str = "Failed to start image generation";
pub const POLL_FAILED: &str = "Failed to check generation status";

const ERROR_POINTERS: &[&str] = &["/detail", "/title"];

#[derive(Clone, Debug)]
pub struct ReplicateAdapter {
    client: Client,
    base_url: String,
    default_model: String,
}

impl ReplicateAdapter {
    pub fn new(client: Client, base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_for<'a>(&'a self, request: &'a ImageJobRequest) -> &'a str {
        request
            .model
            .as_deref()
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.default_model)
    }

    fn token(api_key: &str) -> String {
        format!("Token {}", api_key)
    }

    async fn reject_creation(response: Response) -> RelayError {
        let status = response.status().as_u16();
        let body = AdapterUtils::read_error_body(response).await;
        warn!(status, "Prediction submission rejected");

        if RelayError::is_auth_status(status) {
            return RelayError::auth(IMAGE_AUTH_MESSAGE);
        }

        let message = AdapterUtils::error_message(body.as_ref(), ERROR_POINTERS)
            .unwrap_or_else(|| CREATE_DEFAULT_ERROR.to_string());
        RelayError::upstream(status, message)
    }
}

#[async_trait]
impl PredictionUpstream for ReplicateAdapter {
    async fn create_prediction(&self, request: &ImageJobRequest) -> Result<PredictionJob, RelayError> {
        let model = self.model_for(request);
        AdapterUtils::log_request("replicate", model, request.prompt.len());
        let start_time = Instant::now();

        let response = self
            .client
            .post(format!("{}/models/{}/predictions", self.base_url, model))
            .header(AUTHORIZATION, Self::token(&request.api_key))
            .json(&serde_json::json!({ "input": { "prompt": request.prompt } }))
            .send()
            .await?;

        AdapterUtils::log_response("replicate", response.status().as_u16(), start_time.elapsed().as_millis() as u64);

        if !response.status().is_success() {
            return Err(Self::reject_creation(response).await);
        }

        let prediction: PredictionResponse = response.json().await?;
        let poll_url = prediction
            .urls
            .get
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RelayError::internal(MISSING_POLL_URL))?;

        debug!(id = ?prediction.id, status = ?prediction.status, "Prediction submitted");
        Ok(PredictionJob::from_response(prediction, poll_url))
    }

    async fn fetch_prediction(&self, poll_url: &str, api_key: &str) -> Result<PredictionJob, RelayError> {
        let response = self
            .client
            .get(poll_url)
            .header(AUTHORIZATION, Self::token(api_key))
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!(status, "Prediction status check rejected");
            if RelayError::is_auth_status(status) {
                return Err(RelayError::auth(IMAGE_AUTH_MESSAGE));
            }
            return Err(RelayError::internal(POLL_FAILED));
        }

        let prediction: PredictionResponse = response.json().await.map_err(|e| {
            warn!("Unreadable prediction status: {}", e);
            RelayError::internal(POLL_FAILED)
        })?;

        Ok(PredictionJob::from_response(prediction, poll_url))
    }
}
