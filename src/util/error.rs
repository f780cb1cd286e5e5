use crate::dto::quote_request_dto::FieldViolation;
use crate::repository::repository_error::RepositoryError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerErrorKind {
    Validation,
    PayloadTooLarge,
    TooManyRequests,
    Internal,
    NotificationFailed,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::PayloadTooLarge => "PayloadTooLarge",
            HandlerErrorKind::TooManyRequests => "TooManyRequests",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::NotificationFailed => "NotificationFailed",
        };
        write!(f, "{}", s)
    }
}

impl HandlerErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerErrorKind::Validation => StatusCode::BAD_REQUEST,
            HandlerErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            HandlerErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            HandlerErrorKind::Internal | HandlerErrorKind::NotificationFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body shared by every failing response
#[derive(Debug, Serialize, Deserialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
}

impl HandlerError {
    pub fn new(error: HandlerErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            errors: None,
        }
    }

    pub fn validation(errors: Vec<FieldViolation>) -> Self {
        Self {
            error: HandlerErrorKind::Validation,
            message: "Invalid quote request".to_string(),
            details: None,
            errors: Some(errors),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Internal, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        (status, axum::Json(self)).into_response()
    }
}

/// Failures of the validate → persist → notify pipeline
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Client correctable, nothing was stored or sent
    #[error("Invalid Input: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The store rejected or could not receive the write; no email was sent
    #[error("Persistence Error: {0}")]
    Persistence(String),

    /// The record is stored but the confirmation could not be delivered
    #[error("Notification Error: {reason}")]
    Notification {
        quote_request_id: Option<String>,
        reason: String,
    },
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        ServiceError::Persistence(err.to_string())
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => HandlerError::validation(errors),
            // Store details stay in the logs
            ServiceError::Persistence(_) => {
                HandlerError::internal("Failed to save quote request")
            }
            ServiceError::Notification {
                quote_request_id,
                reason,
            } => {
                let error = HandlerError::new(
                    HandlerErrorKind::NotificationFailed,
                    format!("Failed to send email: {}", reason),
                );
                match quote_request_id {
                    Some(id) => error.with_details(format!("Quote request {} was saved", id)),
                    None => error,
                }
            }
        }
    }
}

/// Rewrite a 413 produced before the handler ran (body limit layer, which
/// answers in plain text) into the JSON error body.
pub async fn payload_too_large_json(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.as_bytes().starts_with(b"application/json"))
        .unwrap_or(false);
    if is_json {
        return response;
    }
    HandlerError::new(HandlerErrorKind::PayloadTooLarge, "Request body is too large").into_response()
}

/// Response for a panic caught while handling a request
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    let mut response = HandlerError::internal("Internal server error").into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HandlerErrorKind::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(HandlerErrorKind::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            HandlerErrorKind::NotificationFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_body() {
        let error = HandlerError::from(ServiceError::Validation(vec![FieldViolation::new(
            "email",
            "Email is required",
        )]));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error"], "Validation");
        assert_eq!(json["errors"][0]["field"], "email");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_persistence_error_hides_store_details() {
        let error = HandlerError::from(ServiceError::from(RepositoryError::connection(
            "mongodb://secret-host:27017 unreachable",
        )));
        assert_eq!(error.error, HandlerErrorKind::Internal);
        assert!(!error.message.contains("secret-host"));
    }

    #[tokio::test]
    async fn test_plain_payload_too_large_becomes_json() {
        let plain = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let response = payload_too_large_json(plain).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let ok = payload_too_large_json(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[test]
    fn test_notification_error_message() {
        let error = HandlerError::from(ServiceError::Notification {
            quote_request_id: Some("abc".to_string()),
            reason: "connection refused".to_string(),
        });
        assert_eq!(error.error, HandlerErrorKind::NotificationFailed);
        assert_eq!(error.message, "Failed to send email: connection refused");
        assert_eq!(error.details.as_deref(), Some("Quote request abc was saved"));
    }
}
