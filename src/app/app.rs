use axum::{http::{HeaderValue, Method, header}, middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, warn, Level};

use crate::config::{AppConfig, ConfigError, EmailConfig, MongoConfig};
use crate::handler::quote_request_handler::health_handler;
use crate::middlewares::rate_limit::RateLimiter;
use crate::middlewares::security_headers::add_security_headers;
use crate::repository::quote_request_repo::MongoQuoteRequestRepository;
use crate::router::quote_request_router::quote_request_router;
use crate::service::quote_request_service::{QuoteRequestService, QuoteRequestServiceImpl};
use crate::util::email::{EmailError, SmtpEmailService};
use crate::util::error::{panic_response, payload_too_large_json};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Email service error: {0}")]
    Email(#[from] EmailError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

pub struct App {
    config: AppConfig,
    router: Router,
    rate_limiter: Arc<RateLimiter>,
}

impl App {
    /// Load configuration and build the process-wide store and mail clients.
    /// A missing MONGO_URI stops startup here.
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;
        let email_config = EmailConfig::from_env()?;

        let quote_request_repo = Arc::new(MongoQuoteRequestRepository::new(&mongo_config).await?);
        let email_service = Arc::new(SmtpEmailService::new(email_config.clone())?);
        if !std::path::Path::new(&email_config.logo_path).exists() {
            warn!("Logo {} not found, confirmations will fail until it exists", email_config.logo_path);
        }

        let quote_request_service: Arc<dyn QuoteRequestService> = Arc::new(
            QuoteRequestServiceImpl::new(quote_request_repo, email_service, &email_config),
        );
        if config.trust_proxy_headers {
            warn!("Rate limiting keys on proxy headers, make sure a trusted proxy sets them");
        }
        let rate_limiter = Arc::new(
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window_secs)
                .with_trusted_proxy_headers(config.trust_proxy_headers),
        );

        let router = build_router(quote_request_service, rate_limiter.clone(), &config);
        Ok(App { config, router, rate_limiter })
    }

    pub async fn start(self) -> Result<(), AppError> {
        let addr = SocketAddr::new(
            self.config
                .host
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("Invalid host: {}", self.config.host)))?,
            self.config.port,
        );

        let limiter = self.rate_limiter.clone();
        let window = Duration::from_secs(self.config.rate_limit_window_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(window);
            loop {
                interval.tick().await;
                limiter.cleanup_expired();
            }
        });

        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        info!("Server stopped");
        Ok(())
    }
}

/// Full HTTP stack: routes, CORS, security headers, body limit, panic
/// catching, request ids and tracing.
pub fn build_router(
    service: Arc<dyn QuoteRequestService>,
    rate_limiter: Arc<RateLimiter>,
    config: &AppConfig,
) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &axum::http::Request<_>| {
            let req_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!("http_request", method = %req.method(), uri = %req.uri(), req_id)
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );
    let req_id = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id());

    let router = Router::new()
        .merge(quote_request_router(service, rate_limiter))
        .route("/health", get(health_handler))
        .layer(cors_layer(config))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(middleware::map_response(payload_too_large_json))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(trace)
        .layer(req_id);

    add_security_headers(router)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
