use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Email configuration for SMTP settings and the quote confirmation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP username for authentication
    pub smtp_username: String,
    /// SMTP password for authentication
    #[serde(skip_serializing)]
    pub smtp_password: String,
    /// Whether to use TLS encryption
    pub use_tls: bool,
    /// Whether to use STARTTLS
    pub use_starttls: bool,
    /// From email address
    pub from_email: String,
    /// From name (display name)
    pub from_name: String,
    /// Address copied on every quote confirmation
    pub operator_email: String,
    /// Image embedded inline in the confirmation
    pub logo_path: String,
    /// Content-ID the HTML template uses to reference the logo
    pub logo_content_id: String,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl EmailConfig {
    /// Create EmailConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading email configuration from environment variables");
        let defaults = EmailConfig::default();

        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| {
            warn!("SMTP_HOST not set, defaulting to {}", defaults.smtp_host);
            defaults.smtp_host.clone()
        });
        debug!("SMTP host: {}", smtp_host);

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| {
                warn!("SMTP_PORT not set, defaulting to 587");
                "587".to_string()
            })
            .parse::<u16>()
            .map_err(|_| {
                error!("Invalid SMTP_PORT value");
                ConfigError::InvalidValue("Invalid SMTP_PORT value".to_string())
            })?;
        debug!("SMTP port: {}", smtp_port);

        let smtp_username = env::var("SMTP_USERNAME").unwrap_or_else(|_| {
            warn!("SMTP_USERNAME not set, confirmation emails will fail until it is configured");
            String::new()
        });
        debug!("SMTP username: {}", smtp_username);

        let smtp_password = env::var("SMTP_PASSWORD").unwrap_or_else(|_| {
            warn!("SMTP_PASSWORD not set, confirmation emails will fail until it is configured");
            String::new()
        });
        debug!("SMTP password: [REDACTED]");

        let use_tls = env::var("SMTP_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);
        debug!("SMTP use TLS: {}", use_tls);

        let use_starttls = env::var("SMTP_USE_STARTTLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);
        debug!("SMTP use STARTTLS: {}", use_starttls);

        let from_email = env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| {
            if smtp_username.is_empty() {
                defaults.from_email.clone()
            } else {
                debug!("SMTP_FROM_EMAIL not set, sending from the SMTP account");
                smtp_username.clone()
            }
        });
        debug!("From email: {}", from_email);

        let from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| defaults.from_name.clone());
        debug!("From name: {}", from_name);

        let operator_email = env::var("QUOTE_OPERATOR_EMAIL").unwrap_or_else(|_| {
            warn!("QUOTE_OPERATOR_EMAIL not set, copying confirmations to the sender address");
            from_email.clone()
        });
        debug!("Operator email: {}", operator_email);

        let logo_path = env::var("SMTP_LOGO_PATH").unwrap_or_else(|_| defaults.logo_path.clone());
        debug!("Logo path: {}", logo_path);

        let logo_content_id =
            env::var("SMTP_LOGO_CONTENT_ID").unwrap_or_else(|_| defaults.logo_content_id.clone());

        let connection_timeout_secs = env::var("SMTP_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .unwrap_or(30);
        debug!("Connection timeout: {} seconds", connection_timeout_secs);

        let config = EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            use_tls,
            use_starttls,
            from_email,
            from_name,
            operator_email,
            logo_path,
            logo_content_id,
            connection_timeout_secs,
        };

        config.validate()?;
        info!("Email configuration loaded successfully");
        Ok(config)
    }

    /// Create EmailConfig for testing
    pub fn from_test_env() -> Self {
        EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            use_tls: false,
            use_starttls: false,
            from_email: "test@example.com".to_string(),
            from_name: "Test App".to_string(),
            operator_email: "operator@example.com".to_string(),
            logo_path: "assets/logo.png".to_string(),
            logo_content_id: "logo".to_string(),
            connection_timeout_secs: 10,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating email configuration");

        if self.smtp_host.is_empty() {
            error!("SMTP host is empty");
            return Err(ConfigError::ValidationError("SMTP host cannot be empty".to_string()));
        }

        if self.smtp_port == 0 {
            error!("SMTP port is 0");
            return Err(ConfigError::ValidationError("SMTP port cannot be 0".to_string()));
        }

        if !self.from_email.contains('@') {
            error!("Invalid from email format");
            return Err(ConfigError::ValidationError("Invalid from email format".to_string()));
        }

        if !self.operator_email.contains('@') {
            error!("Invalid operator email format");
            return Err(ConfigError::ValidationError("Invalid operator email format".to_string()));
        }

        if self.logo_content_id.is_empty() || self.logo_content_id.contains(&['<', '>', ' '][..]) {
            error!("Invalid logo content id");
            return Err(ConfigError::ValidationError(
                "Logo content id must be a non-empty token without spaces or angle brackets".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            error!("Connection timeout is 0");
            return Err(ConfigError::ValidationError("Connection timeout cannot be 0".to_string()));
        }

        info!("Email configuration validation successful");
        Ok(())
    }

    /// Both SMTP credentials are present. Sending is refused without them.
    pub fn has_credentials(&self) -> bool {
        !self.smtp_username.is_empty() && !self.smtp_password.is_empty()
    }

    /// Get SMTP server URL
    pub fn get_smtp_url(&self) -> String {
        format!("{}:{}", self.smtp_host, self.smtp_port)
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: "".to_string(),
            smtp_password: "".to_string(),
            use_tls: true,
            use_starttls: true,
            from_email: "noreply@example.com".to_string(),
            from_name: "Quote Requests".to_string(),
            operator_email: "noreply@example.com".to_string(),
            logo_path: "assets/logo.png".to_string(),
            logo_content_id: "logo".to_string(),
            connection_timeout_secs: 30,
        }
    }
}
