use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::dto::quote_request_dto::{
    CreateQuoteRequest, FieldViolation, QuoteRequestCreatedResponse, QuoteRequestResponseDto,
};
use crate::service::quote_request_service::QuoteRequestService;
use crate::util::error::{HandlerError, HandlerErrorKind};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn create_quote_request_handler(
    State(service): State<Arc<dyn QuoteRequestService>>,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    info!("[create_quote_request_handler] Handler called");

    let Json(request) = payload.map_err(|rejection| {
        warn!("[create_quote_request_handler] Rejected body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HandlerError::new(HandlerErrorKind::PayloadTooLarge, "Request body is too large")
        } else {
            HandlerError::validation(vec![FieldViolation::new("body", rejection.body_text())])
        }
    })?;

    let stored = service.submit_quote_request(request).await?;

    Ok((
        StatusCode::OK,
        Json(QuoteRequestCreatedResponse {
            message: "Quote request submitted successfully".to_string(),
            data: QuoteRequestResponseDto::from(stored),
        }),
    ))
}

pub async fn health_handler() -> &'static str {
    "OK"
}
