//! # HTTP Client Factory
//!
//! Builds the single `reqwest::Client` shared by every upstream adapter.
//! Chat completions stream for as long as the provider keeps producing
//! tokens, so the client bounds each read rather than the whole request.

use crate::config::Config;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("Failed to build HTTP client: {0}")]
    BuildError(#[from] reqwest::Error),
}

/// Idle connection pool settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub keepalive: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Longest stall allowed between two reads of a response body
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool: PoolConfig,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool: PoolConfig::default(),
            user_agent: format!("ai-relay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&Config> for HttpClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            read_timeout: Duration::from_secs(config.http_client_timeout),
            connect_timeout: Duration::from_secs(config.http_connect_timeout),
            ..Self::default()
        }
    }
}

pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            config: HttpClientConfig::from(config),
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Client, HttpClientError> {
        let mut builder = Client::builder()
            .read_timeout(self.config.read_timeout)
            .connect_timeout(self.config.connect_timeout)
            .pool_max_idle_per_host(self.config.pool.max_idle_per_host)
            .pool_idle_timeout(self.config.pool.idle_timeout)
            .user_agent(self.config.user_agent)
            .use_rustls_tls();

        if let Some(keepalive) = self.config.pool.keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build().map_err(HttpClientError::from)
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
