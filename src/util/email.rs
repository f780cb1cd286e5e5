use crate::config::{ConfigError, EmailConfig};
use async_trait::async_trait;
use lettre::{
    message::{
        header::ContentType, Attachment, Mailbox, MessageBuilder, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Email service errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SMTP error: {0}")]
    SmtpError(String),

    #[error("Message building error: {0}")]
    MessageError(String),

    #[error("Address error: {0}")]
    AddressError(String),

    #[error("Attachment error: {0}")]
    AttachmentError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

/// Image shown inside the HTML body through `cid:<content_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_id: String,
    pub path: PathBuf,
}

impl InlineImage {
    pub fn new(content_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            content_id: content_id.into(),
            path: path.into(),
        }
    }

    /// MIME type guessed from the file extension
    pub fn content_type(&self) -> &'static str {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// Email message builder
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub cc: Vec<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub inline_images: Vec<InlineImage>,
}

impl EmailMessage {
    pub fn new(to: String, subject: String) -> Self {
        Self {
            to,
            cc: Vec::new(),
            subject,
            text_body: None,
            html_body: None,
            inline_images: Vec::new(),
        }
    }

    pub fn with_cc(mut self, cc: String) -> Self {
        self.cc.push(cc);
        self
    }

    pub fn with_text_body(mut self, body: String) -> Self {
        self.text_body = Some(body);
        self
    }

    pub fn with_html_body(mut self, body: String) -> Self {
        self.html_body = Some(body);
        self
    }

    pub fn with_inline_image(mut self, image: InlineImage) -> Self {
        self.inline_images.push(image);
        self
    }
}

/// Outbound notification sink
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// SMTP email service implementation
pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Create a new SMTP email service
    #[instrument(skip(config), fields(host = %config.smtp_host, port = config.smtp_port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        info!("Initializing SMTP email service");

        config.validate().map_err(EmailError::from)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .timeout(Some(std::time::Duration::from_secs(config.connection_timeout_secs)));

        if config.use_tls {
            let tls_parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;

            if config.use_starttls {
                transport_builder = transport_builder.tls(Tls::Required(tls_parameters));
            } else {
                transport_builder = transport_builder.tls(Tls::Wrapper(tls_parameters));
            }
        } else {
            transport_builder = transport_builder.tls(Tls::None);
        }

        if config.has_credentials() {
            let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
            transport_builder = transport_builder.credentials(credentials);
        } else {
            warn!("SMTP credentials missing, sending is disabled");
        }

        let transport = transport_builder.build();

        info!("SMTP email service initialized successfully");
        Ok(Self { config, transport })
    }

    /// Build a lettre Message from EmailMessage, reading inline images from disk
    pub async fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let mut images = Vec::with_capacity(email_message.inline_images.len());
        for image in &email_message.inline_images {
            let bytes = tokio::fs::read(&image.path).await.map_err(|e| {
                error!("Failed to read inline image {}: {}", image.path.display(), e);
                EmailError::AttachmentError(format!(
                    "Failed to read inline image {}: {}",
                    image.path.display(),
                    e
                ))
            })?;
            images.push((image.clone(), bytes));
        }
        compose_message(&self.config, email_message, images)
    }
}

#[async_trait]
impl EmailSender for SmtpEmailService {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!("Sending email to: {}", message.to);

        if !self.config.has_credentials() {
            error!("Refusing to send email without SMTP credentials");
            return Err(EmailError::ConfigError("SMTP credentials are not configured".to_string()));
        }

        validate_email_address(&message.to)?;
        for cc in &message.cc {
            validate_email_address(cc)?;
        }

        let email_message = self.build_message(message).await?;

        self.transport.send(email_message).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            EmailError::SmtpError(e.to_string())
        })?;

        info!("Email sent successfully");
        Ok(())
    }
}

/// Assemble the MIME structure.
///
/// `alternative(text, related(html, images...))` when both bodies exist; the
/// related wrapper is only added when there are inline images.
pub fn compose_message(
    config: &EmailConfig,
    email_message: EmailMessage,
    images: Vec<(InlineImage, Vec<u8>)>,
) -> Result<Message, EmailError> {
    let from_mailbox: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;

    let to_mailbox: Mailbox = email_message
        .to
        .parse()
        .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

    let mut message_builder: MessageBuilder = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(&email_message.subject);

    for cc in &email_message.cc {
        let cc_mailbox: Mailbox = cc
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid cc address: {}", e)))?;
        message_builder = message_builder.cc(cc_mailbox);
    }

    let html_part = match email_message.html_body {
        Some(html) => Some(html_part_with_images(html, images)?),
        None => None,
    };

    let message = match (email_message.text_body, html_part) {
        (Some(text), Some(HtmlPart::Single(html))) => message_builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text))
                .singlepart(html),
        ),
        (Some(text), Some(HtmlPart::Related(html))) => message_builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text))
                .multipart(html),
        ),
        (Some(text), None) => message_builder.body(text),
        (None, Some(HtmlPart::Single(html))) => message_builder.singlepart(html),
        (None, Some(HtmlPart::Related(html))) => message_builder.multipart(html),
        (None, None) => {
            return Err(EmailError::MessageError("No message body provided".to_string()));
        }
    };

    message.map_err(|e| EmailError::MessageError(format!("Failed to build message: {}", e)))
}

enum HtmlPart {
    Single(SinglePart),
    Related(MultiPart),
}

fn html_part_with_images(
    html: String,
    images: Vec<(InlineImage, Vec<u8>)>,
) -> Result<HtmlPart, EmailError> {
    if images.is_empty() {
        return Ok(HtmlPart::Single(SinglePart::html(html)));
    }
    let mut related = MultiPart::related().singlepart(SinglePart::html(html));
    for (image, bytes) in images {
        let content_type = ContentType::parse(image.content_type()).map_err(|e| {
            EmailError::AttachmentError(format!("Invalid content type for {}: {}", image.content_id, e))
        })?;
        related = related.singlepart(Attachment::new_inline(image.content_id.clone()).body(bytes, content_type));
    }
    Ok(HtmlPart::Related(related))
}

/// Validate email address format
pub fn validate_email_address(email: &str) -> Result<(), EmailError> {
    if email.is_empty() {
        return Err(EmailError::AddressError("Email address cannot be empty".to_string()));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(EmailError::AddressError(format!("Invalid email format: {}", email)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).to_string()
    }

    #[test]
    fn test_inline_image_content_type() {
        assert_eq!(InlineImage::new("logo", "assets/logo.png").content_type(), "image/png");
        assert_eq!(InlineImage::new("logo", "assets/LOGO.JPG").content_type(), "image/jpeg");
        assert_eq!(
            InlineImage::new("logo", "assets/logo").content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_compose_with_cc_and_inline_image() {
        let config = EmailConfig::from_test_env();
        let message = EmailMessage::new("jane@example.com".to_string(), "Hello".to_string())
            .with_cc("operator@example.com".to_string())
            .with_text_body("plain".to_string())
            .with_html_body("<img src=\"cid:logo\">".to_string());
        let images = vec![(InlineImage::new("logo", "logo.png"), vec![0x89, 0x50, 0x4e, 0x47])];

        let built = compose_message(&config, message, images).expect("message builds");
        let raw = formatted(&built);
        assert!(raw.contains("To: jane@example.com"));
        assert!(raw.contains("Cc: operator@example.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("multipart/related"));
        assert!(raw.contains("Content-ID: <logo>"));
        assert!(raw.contains("image/png"));
    }

    #[test]
    fn test_compose_without_body_fails() {
        let config = EmailConfig::from_test_env();
        let message = EmailMessage::new("jane@example.com".to_string(), "Hello".to_string());
        let result = compose_message(&config, message, Vec::new());
        assert!(matches!(result, Err(EmailError::MessageError(_))));
    }

    #[test]
    fn test_compose_rejects_bad_recipient() {
        let config = EmailConfig::from_test_env();
        let message = EmailMessage::new("not an address".to_string(), "Hello".to_string())
            .with_text_body("plain".to_string());
        let result = compose_message(&config, message, Vec::new());
        assert!(matches!(result, Err(EmailError::AddressError(_))));
    }

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("a@b.com").is_ok());
        assert!(validate_email_address("").is_err());
        assert!(validate_email_address("a.b.com").is_err());
        assert!(validate_email_address("a@@b.com").is_err());
    }

    #[tokio::test]
    async fn test_missing_inline_image_is_attachment_error() {
        let service = SmtpEmailService::new(EmailConfig::from_test_env()).expect("service");
        let message = EmailMessage::new("jane@example.com".to_string(), "Hello".to_string())
            .with_html_body("<p>hi</p>".to_string())
            .with_inline_image(InlineImage::new("logo", "does/not/exist.png"));
        let result = service.build_message(message).await;
        assert!(matches!(result, Err(EmailError::AttachmentError(_))));
    }
}
