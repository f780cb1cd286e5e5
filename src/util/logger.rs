use std::path::Path;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "quote-request-api";

/// Console plus daily rolling text/JSON files. Keep the guards alive for the
/// whole process or buffered lines are lost.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let guards = Self::setup_logging(Path::new(&log_dir))?;
        Ok(Logger { guards })
    }

    pub fn setup_logging(log_dir: &Path) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error>> {
        let error_dir = log_dir.join("error");
        let json_dir = log_dir.join("json");
        let error_json_dir = error_dir.join("json");
        for dir in [log_dir, error_dir.as_path(), json_dir.as_path(), error_json_dir.as_path()] {
            std::fs::create_dir_all(dir)?;
        }

        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,quote_request_api=debug"));
        let file_log_level = std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let error_file_log_level =
            std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string());

        let (general, general_guard) =
            non_blocking(rolling::daily(log_dir, format!("{}.log", LOG_FILE_PREFIX)));
        let (error, error_guard) =
            non_blocking(rolling::daily(&error_dir, format!("{}-error.log", LOG_FILE_PREFIX)));
        let (general_json, general_json_guard) =
            non_blocking(rolling::daily(&json_dir, format!("{}.json", LOG_FILE_PREFIX)));
        let (error_json, error_json_guard) =
            non_blocking(rolling::daily(&error_json_dir, format!("{}-error.json", LOG_FILE_PREFIX)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .with_writer(error)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(general_json)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(error_json)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .try_init()?;

        Ok(vec![general_guard, error_guard, general_json_guard, error_json_guard])
    }
}
