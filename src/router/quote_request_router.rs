use axum::{middleware, routing::post, Router};
use crate::handler::quote_request_handler::create_quote_request_handler;
use crate::middlewares::rate_limit::{rate_limit, RateLimiter};
use crate::service::quote_request_service::QuoteRequestService;
use std::sync::Arc;

pub const QUOTE_REQUEST_PATH: &str = "/api/quote-request";

pub fn quote_request_router(
    service: Arc<dyn QuoteRequestService>,
    rate_limiter: Arc<RateLimiter>,
) -> Router {
    Router::new()
        .route(QUOTE_REQUEST_PATH, post(create_quote_request_handler))
        .route_layer(middleware::from_fn_with_state(rate_limiter, rate_limit))
        .with_state(service)
}
