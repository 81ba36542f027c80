//! # Application State
//!
//! Shared state handed to every handler: configuration, the two upstream
//! seams and the poll policy for image jobs.

use std::sync::Arc;

use crate::{
    adapters::{ChatUpstream, OpenAICompatibleAdapter, PredictionUpstream, ReplicateAdapter},
    config::Config,
    core::http_client::{HttpClientBuilder, HttpClientError},
    polling::PollPolicy,
    providers::ProviderRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Chat completions and key checks
    pub chat: Arc<dyn ChatUpstream>,
    /// Asynchronous image predictions
    pub images: Arc<dyn PredictionUpstream>,
    pub poll_policy: PollPolicy,
}

impl AppState {
    /// Build state with the real HTTP adapters sharing one client.
    pub fn new(config: Config) -> Result<Self, HttpClientError> {
        let client = HttpClientBuilder::from_config(&config).build()?;

        let chat = OpenAICompatibleAdapter::new(client.clone(), ProviderRegistry::from_config(&config));
        let images = ReplicateAdapter::new(
            client,
            config.replicate_base_url.clone(),
            config.replicate_default_model.clone(),
        );

        Ok(Self::with_upstreams(config, Arc::new(chat), Arc::new(images)))
    }

    /// Build state around caller-supplied upstreams.
    pub fn with_upstreams(
        config: Config,
        chat: Arc<dyn ChatUpstream>,
        images: Arc<dyn PredictionUpstream>,
    ) -> Self {
        let poll_policy = PollPolicy::from_config(&config);
        Self {
            config,
            chat,
            images,
            poll_policy,
        }
    }

    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn chat(&self) -> &dyn ChatUpstream {
        self.chat.as_ref()
    }

    pub fn images(&self) -> &dyn PredictionUpstream {
        self.images.as_ref()
    }
}
