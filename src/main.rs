//! image-registry-webhook - validating admission webhook for container registries.
//!
//! This is the main entry point that:
//! - Parses configuration
//! - Initializes structured logging
//! - Starts the health server and the TLS webhook server
//! - Drains in-flight requests on SIGTERM/SIGINT

use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use image_registry_webhook::health::run_health_server;
use image_registry_webhook::webhooks::shutdown_webhook_server;
use image_registry_webhook::{Config, HealthState, LogFormat, WebhookState, run_webhook_server};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive("image_registry_webhook=info".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(config.log_format)?;

    info!("Starting image-registry-webhook");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        error!("Failed to install rustls crypto provider");
        return Err("rustls crypto provider already installed".into());
    }

    let missing = config.missing_tls_files();
    if !missing.is_empty() {
        for path in &missing {
            error!(path = %path.display(), "TLS file does not exist");
        }
        return Err("webhook TLS certificate or key not found".into());
    }

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately so liveness works during start-up
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let server_handle = Handle::new();
    let mut webhook_handle = {
        let state = Arc::new(WebhookState::new(health_state.clone()));
        let config = config.clone();
        let handle = server_handle.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(
                state,
                config.port,
                &config.tls_cert_file,
                &config.tls_key_file,
                config.max_body_bytes,
                handle,
            )
            .await
            {
                error!("Webhook server error: {}", e);
            }
        })
    };

    // Wait for any task to complete (or fail), or shutdown signal
    let shutdown_requested = tokio::select! {
        result = &mut webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
            false
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
            false
        }
        _ = shutdown_signal() => true,
    };

    if shutdown_requested {
        info!("Received shutdown signal, initiating graceful shutdown...");

        // Mark as not ready to stop receiving new admission calls
        health_state.set_ready(false).await;
        info!("Marked webhook as not ready");

        info!(
            "Waiting up to {}s for in-flight admission requests to complete...",
            SHUTDOWN_GRACE_PERIOD_SECS
        );
        let grace = Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS);
        if shutdown_webhook_server(&server_handle, webhook_handle, grace).await {
            info!("In-flight admission requests drained");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
