use dotenv::dotenv;
use quote_request_api::app::app::App;
use quote_request_api::util::logger::Logger;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Read .env before the logger so LOG_DIR and RUST_LOG apply
    let dotenv_result = dotenv();

    let guards = match Logger::new() {
        Ok(logger) => logger.guards,
        Err(e) => {
            eprintln!("Failed to initialize file logging: {}", e);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .try_init();
            Vec::new()
        }
    };

    info!("🚀 Starting Quote Request API");
    match dotenv_result {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {}", e);
            drop(guards);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.start().await {
        error!("Server error: {}", e);
        drop(guards);
        std::process::exit(1);
    }
    drop(guards);
}
