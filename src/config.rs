#[cfg(feature = "cli")]
use clap::Parser;
use std::time::Duration;
use url::Url;

/// # Relay Configuration
///
/// Command-line arguments and environment variables (optionally loaded from a
/// `.env` file) describing where the relay listens, which upstream endpoints
/// it talks to, and how long it waits on them. API keys are never part of the
/// configuration; callers supply them per request.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "ai-relay"))]
#[cfg_attr(feature = "cli", command(about = "HTTP relay for streaming chat completions and asynchronous image generation"))]
#[cfg_attr(feature = "cli", command(version))]
pub struct Config {
    // =============================================================================
    // CORE SERVER CONFIGURATION
    // =============================================================================

    /// Server port to listen on
    #[cfg_attr(feature = "cli", arg(short, long, env = "PORT", default_value = "5000"))]
    pub port: u16,

    /// Server host to bind to
    #[cfg_attr(feature = "cli", arg(long, env = "HOST", default_value = "0.0.0.0"))]
    pub host: String,

    // =============================================================================
    // CHAT PROVIDERS
    // =============================================================================

    /// Base URL of the default OpenAI-compatible chat provider
    #[cfg_attr(feature = "cli", arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1"))]
    pub openai_base_url: String,

    /// Model used for the default provider when the request names none
    #[cfg_attr(feature = "cli", arg(long, env = "OPENAI_DEFAULT_MODEL", default_value = "gpt-4o-mini"))]
    pub openai_default_model: String,

    /// Base URL of the DeepSeek chat provider
    #[cfg_attr(feature = "cli", arg(long, env = "DEEPSEEK_BASE_URL", default_value = "https://api.deepseek.com"))]
    pub deepseek_base_url: String,

    /// Model used for DeepSeek when the request names none
    #[cfg_attr(feature = "cli", arg(long, env = "DEEPSEEK_DEFAULT_MODEL", default_value = "deepseek-chat"))]
    pub deepseek_default_model: String,

    // =============================================================================
    // IMAGE GENERATION PROVIDER
    // =============================================================================

    /// Base URL of the prediction API
    #[cfg_attr(feature = "cli", arg(long, env = "REPLICATE_BASE_URL", default_value = "https://api.replicate.com/v1"))]
    pub replicate_base_url: String,

    /// Image model used when the request names none
    #[cfg_attr(feature = "cli", arg(long, env = "REPLICATE_DEFAULT_MODEL", default_value = "black-forest-labs/flux-schnell"))]
    pub replicate_default_model: String,

    /// Milliseconds to wait between prediction status checks
    #[cfg_attr(feature = "cli", arg(long, env = "POLL_INTERVAL_MS", default_value = "2000"))]
    pub poll_interval_ms: u64,

    /// Maximum number of prediction status checks before giving up
    #[cfg_attr(feature = "cli", arg(long, env = "MAX_POLL_ATTEMPTS", default_value = "120"))]
    pub max_poll_attempts: u32,

    // =============================================================================
    // HTTP CLIENT
    // =============================================================================

    /// Seconds an upstream read may stall before the request is abandoned
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CLIENT_TIMEOUT", default_value = "60"))]
    pub http_client_timeout: u64,

    /// Seconds allowed for establishing an upstream connection
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10"))]
    pub http_connect_timeout: u64,

    // =============================================================================
    // LOGGING AND SECURITY
    // =============================================================================

    /// Extra allowed CORS origins (localhost origins are always allowed)
    #[cfg_attr(feature = "cli", arg(long, env = "CORS_ORIGINS", value_delimiter = ','))]
    pub cors_origins: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    #[cfg_attr(feature = "cli", arg(long, env = "LOG_LEVEL", default_value = "info"))]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[cfg_attr(feature = "cli", arg(long, env = "ENVIRONMENT", default_value = "development"))]
    pub environment: String,
}

impl Config {
    /// Parse configuration from command line arguments and environment variables.
    ///
    /// Loads `.env` if present, parses arguments, installs logging and exits
    /// the process with a message when validation fails.
    #[cfg(feature = "cli")]
    pub fn parse_args() -> Self {
        let _ = dotenv::dotenv();

        let config = Self::parse();

        config.setup_logging();

        if let Err(err) = config.validate() {
            eprintln!("Configuration validation failed: {}", err);
            std::process::exit(1);
        }

        config
    }

    /// Create a test configuration with the production defaults.
    pub fn for_test() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_default_model: "gpt-4o-mini".to_string(),
            deepseek_base_url: "https://api.deepseek.com".to_string(),
            deepseek_default_model: "deepseek-chat".to_string(),
            replicate_base_url: "https://api.replicate.com/v1".to_string(),
            replicate_default_model: "black-forest-labs/flux-schnell".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 120,
            http_client_timeout: 60,
            http_connect_timeout: 10,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Install the tracing subscriber. Safe to call more than once.
    #[cfg(feature = "cli")]
    pub fn setup_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(&self.log_level)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .try_init();
    }

    /// Validate configuration values and provide helpful error messages.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0. Please specify a valid port number (1-65535).".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty. Please specify a valid host (e.g., '0.0.0.0' or 'localhost').".to_string());
        }

        for (name, value) in [
            ("OpenAI base URL", &self.openai_base_url),
            ("DeepSeek base URL", &self.deepseek_base_url),
            ("Replicate base URL", &self.replicate_base_url),
        ] {
            Self::validate_base_url(name, value)?;
        }

        for (name, value) in [
            ("OpenAI default model", &self.openai_default_model),
            ("DeepSeek default model", &self.deepseek_default_model),
            ("Replicate default model", &self.replicate_default_model),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} cannot be empty.", name));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be greater than 0 milliseconds.".to_string());
        }
        if self.max_poll_attempts == 0 {
            return Err("Max poll attempts must be greater than 0.".to_string());
        }

        if self.http_client_timeout == 0 {
            return Err("HTTP client timeout must be greater than 0 seconds.".to_string());
        }
        if self.http_connect_timeout == 0 {
            return Err("HTTP connect timeout must be greater than 0 seconds.".to_string());
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.as_str()) {
            return Err(format!(
                "Invalid environment '{}'. Valid options are: {}",
                self.environment,
                valid_environments.join(", ")
            ));
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid options are: {}",
                self.log_level,
                valid_log_levels.join(", ")
            ));
        }

        if self.environment == "production" && (self.log_level == "debug" || self.log_level == "trace") {
            eprintln!(
                "⚠️  Warning: Using debug/trace logging in production may impact performance \
                and expose sensitive information in logs."
            );
        }

        Ok(())
    }

    fn validate_base_url(name: &str, value: &str) -> Result<(), String> {
        match Url::parse(value) {
            Ok(url) => {
                if !["http", "https"].contains(&url.scheme()) {
                    return Err(format!(
                        "Invalid {} scheme '{}'. Only 'http' and 'https' are supported.",
                        name,
                        url.scheme()
                    ));
                }
                if url.host().is_none() {
                    return Err(format!("{} must include a host.", name));
                }
                Ok(())
            }
            Err(err) => Err(format!("Invalid {} '{}': {}", name, value, err)),
        }
    }
}
