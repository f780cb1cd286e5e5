use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;
use crate::middlewares::rate_limit::MAX_WINDOW_SECS;

/// HTTP server and request policy settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    /// Requests allowed per client within one rate limit window
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    /// Key rate limits on `x-forwarded-for` / `x-real-ip` instead of the peer
    /// address. Enable only behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    /// Load server configuration from environment variables
    ///
    /// - APP_HOST (defaults to 0.0.0.0)
    /// - PORT, falling back to APP_PORT (defaults to 4000)
    /// - CORS_ALLOWED_ORIGINS: comma separated, `*` or unset allows any origin
    /// - RATE_LIMIT_MAX_REQUESTS (defaults to 100)
    /// - RATE_LIMIT_WINDOW_SECS (defaults to 900, at most 86400)
    /// - TRUST_PROXY_HEADERS (defaults to false)
    /// - REQUEST_BODY_LIMIT_BYTES (defaults to 102400)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading application configuration from environment variables");
        let defaults = AppConfig::default();

        let host = env::var("APP_HOST").unwrap_or_else(|_| defaults.host.clone());
        debug!("App host: {}", host);

        let port = match env::var("PORT").or_else(|_| env::var("APP_PORT")) {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|_| {
                error!("Invalid PORT value: {}", raw);
                ConfigError::InvalidValue(format!("Invalid PORT value: {}", raw))
            })?,
            Err(_) => {
                warn!("PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };
        debug!("App port: {}", port);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        if cors_allowed_origins.is_empty() {
            debug!("CORS allows any origin");
        } else {
            debug!("CORS allowed origins: {:?}", cors_allowed_origins);
        }

        let rate_limit_max_requests = env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| defaults.rate_limit_max_requests.to_string())
            .parse::<u32>()
            .map_err(|_| {
                error!("Invalid RATE_LIMIT_MAX_REQUESTS value");
                ConfigError::InvalidValue("Invalid RATE_LIMIT_MAX_REQUESTS value".to_string())
            })?;

        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| defaults.rate_limit_window_secs.to_string())
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid RATE_LIMIT_WINDOW_SECS value");
                ConfigError::InvalidValue("Invalid RATE_LIMIT_WINDOW_SECS value".to_string())
            })?;
        debug!(
            "Rate limit: {} requests per {} seconds",
            rate_limit_max_requests, rate_limit_window_secs
        );

        let trust_proxy_headers = env::var("TRUST_PROXY_HEADERS")
            .map(|raw| raw.trim().parse::<bool>())
            .unwrap_or(Ok(defaults.trust_proxy_headers))
            .map_err(|_| {
                error!("Invalid TRUST_PROXY_HEADERS value");
                ConfigError::InvalidValue("Invalid TRUST_PROXY_HEADERS value".to_string())
            })?;
        debug!("Trust proxy headers: {}", trust_proxy_headers);

        let body_limit_bytes = env::var("REQUEST_BODY_LIMIT_BYTES")
            .unwrap_or_else(|_| defaults.body_limit_bytes.to_string())
            .parse::<usize>()
            .map_err(|_| {
                error!("Invalid REQUEST_BODY_LIMIT_BYTES value");
                ConfigError::InvalidValue("Invalid REQUEST_BODY_LIMIT_BYTES value".to_string())
            })?;

        let config = AppConfig {
            host,
            port,
            cors_allowed_origins,
            rate_limit_max_requests,
            rate_limit_window_secs,
            trust_proxy_headers,
            body_limit_bytes,
        };

        config.validate()?;
        info!("Application configuration loaded successfully");
        Ok(config)
    }

    /// Create AppConfig for testing
    pub fn from_test_env() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: Vec::new(),
            rate_limit_max_requests: 1000,
            rate_limit_window_secs: 60,
            trust_proxy_headers: false,
            body_limit_bytes: 100 * 1024,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("App host cannot be empty".to_string()));
        }
        if self.rate_limit_max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "Rate limit must allow at least one request".to_string(),
            ));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit_window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::ValidationError(format!(
                "Rate limit window cannot exceed {} seconds",
                MAX_WINDOW_SECS
            )));
        }
        if self.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "Request body limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_allowed_origins: Vec::new(),
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 15 * 60,
            trust_proxy_headers: false,
            body_limit_bytes: 100 * 1024,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.to_string())
        .collect();
    // A wildcard anywhere collapses to "any origin"
    if origins.iter().any(|origin| origin == "*") {
        return Vec::new();
    }
    origins
}
