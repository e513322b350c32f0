//! Runs one generation request and prints the report.
//!
//! `avgen [request.json]` runs video and narration together.
//! `avgen --tts-only [narration.json]` runs the narration alone.

use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use avgen_orchestrator::{input, metrics, Orchestrator, OrchestratorConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider was already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("avgen=info"));

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

    info!("Starting avgen");

    let config = match OrchestratorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Orchestrator config: {:?}", config);

    let metrics_handle = match &config.metrics_path {
        Some(_) => match metrics::init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        },
        None => None,
    };

    let mut args = std::env::args().skip(1).peekable();
    let narration_only = args.next_if(|a| a == "--tts-only").is_some();
    let request_path = args.next().map(PathBuf::from);

    let orchestrator = match Orchestrator::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to create orchestrator: {}", e);
            std::process::exit(1);
        }
    };

    let (summary, succeeded) = if narration_only {
        let request = match &request_path {
            Some(path) => input::narration_from_file(path).await,
            None => input::narration_from_lookup(|key| std::env::var(key).ok(), &config.narration_model),
        };
        let request = match request {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to load narration request: {}", e);
                std::process::exit(1);
            }
        };
        match orchestrator.run_narration_only(&request).await {
            Ok(report) => (report.to_string(), report.is_success()),
            Err(e) => {
                error!("Narration run failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let request = match &request_path {
            Some(path) => input::request_from_file(path).await,
            None => input::request_from_lookup(|key| std::env::var(key).ok(), &config.narration_model),
        };
        let request = match request {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to load generation request: {}", e);
                std::process::exit(1);
            }
        };
        match orchestrator.run(&request).await {
            Ok(report) => (report.to_string(), report.is_success()),
            Err(e) => {
                error!("Run failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    if let (Some(handle), Some(path)) = (&metrics_handle, &config.metrics_path) {
        if let Err(e) = metrics::write_snapshot(handle, path).await {
            warn!("Failed to write metrics snapshot to {}: {}", path.display(), e);
        }
    }

    println!("{}", summary);

    if !succeeded {
        std::process::exit(1);
    }
}
