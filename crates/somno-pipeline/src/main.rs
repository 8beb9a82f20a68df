//! Sleep music pipeline binary.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use somno_pipeline::{Pipeline, Settings};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("somno=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting somno-pipeline");

    // Load configuration
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = match Pipeline::new(settings) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to initialize pipeline: {}", e);
            std::process::exit(1);
        }
    };

    match pipeline.run().await {
        Ok(outcome) => {
            info!(
                "Pipeline completed successfully: {} (\"{}\")",
                outcome.youtube_url, outcome.title
            );
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            // Best-effort failure notification; its own failure is only
            // logged.
            if let Err(notify_err) = pipeline
                .notifier()
                .notify(&format!("Pipeline failed: {e}"))
                .await
            {
                warn!("Failure notification also failed: {}", notify_err);
            }
            std::process::exit(1);
        }
    }
}
