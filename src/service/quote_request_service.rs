use crate::config::EmailConfig;
use crate::dto::quote_request_dto::CreateQuoteRequest;
use crate::model::quote_request::QuoteRequest;
use crate::repository::quote_request_repo::QuoteRequestRepository;
use crate::util::email::{EmailMessage, EmailSender, InlineImage};
use crate::util::email_template::{
    render_quote_request_html, render_quote_request_text, QUOTE_REQUEST_SUBJECT,
};
use crate::util::error::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait QuoteRequestService: Send + Sync {
    /// Validate, store and confirm one submission.
    ///
    /// The record is stored before any email is attempted. A failed store
    /// write means no email; a failed email leaves the stored record in place.
    async fn submit_quote_request(&self, request: CreateQuoteRequest) -> Result<QuoteRequest, ServiceError>;
}

pub struct QuoteRequestServiceImpl {
    pub quote_request_repo: Arc<dyn QuoteRequestRepository>,
    pub email_sender: Arc<dyn EmailSender>,
    operator_email: String,
    logo: InlineImage,
}

impl QuoteRequestServiceImpl {
    pub fn new(
        quote_request_repo: Arc<dyn QuoteRequestRepository>,
        email_sender: Arc<dyn EmailSender>,
        email_config: &EmailConfig,
    ) -> Self {
        Self {
            quote_request_repo,
            email_sender,
            operator_email: email_config.operator_email.clone(),
            logo: InlineImage::new(email_config.logo_content_id.clone(), email_config.logo_path.clone()),
        }
    }

    /// Confirmation addressed to the submitter with the operator in copy
    pub fn confirmation_message(&self, quote_request: &QuoteRequest) -> EmailMessage {
        EmailMessage::new(quote_request.email.clone(), QUOTE_REQUEST_SUBJECT.to_string())
            .with_cc(self.operator_email.clone())
            .with_text_body(render_quote_request_text(quote_request))
            .with_html_body(render_quote_request_html(quote_request, &self.logo.content_id))
            .with_inline_image(self.logo.clone())
    }
}

#[async_trait]
impl QuoteRequestService for QuoteRequestServiceImpl {
    #[instrument(skip(self, request))]
    async fn submit_quote_request(&self, request: CreateQuoteRequest) -> Result<QuoteRequest, ServiceError> {
        // 1. Validate
        let quote_request = request.into_quote_request().map_err(|violations| {
            warn!(count = violations.len(), "Quote request rejected by validation");
            ServiceError::Validation(violations)
        })?;

        // 2. Persist
        let stored = self.quote_request_repo.create(quote_request).await.map_err(|e| {
            error!("Failed to store quote request, confirmation not sent: {}", e);
            ServiceError::from(e)
        })?;
        let quote_request_id = stored.id.map(|id| id.to_hex());
        info!(id = ?quote_request_id, "Quote request stored");

        // 3. Notify
        let message = self.confirmation_message(&stored);
        if let Err(e) = self.email_sender.send_email(message).await {
            error!(id = ?quote_request_id, "Quote request stored but confirmation failed: {}", e);
            return Err(ServiceError::Notification {
                quote_request_id,
                reason: e.to_string(),
            });
        }

        info!(id = ?quote_request_id, "Quote request confirmation sent");
        Ok(stored)
    }
}
