//! Admission webhook server.
//!
//! Serves `POST /validate` over TLS. Each call runs once through
//! decode → resolve kind → extract containers → evaluate → encode, with no
//! retries; the API server owns retry and timeout policy.
//!
//! To enable the webhook:
//! 1. Issue a serving certificate (e.g. with cert-manager)
//! 2. Mount it into the pod at /etc/webhook/certs/
//! 3. Create a ValidatingWebhookConfiguration for pods and deployments
//!    pointing at `/validate`

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::AdmissionRequest;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::health::HealthState;
use crate::webhooks::audit::{AuditSink, DecisionRecord, TracingAuditSink};
use crate::webhooks::error::{AdmissionError, Result};
use crate::webhooks::extract::ResourceKind;
use crate::webhooks::policies::evaluate_images;
use crate::webhooks::review::{self, JSON_CONTENT_TYPE};

/// Path the ValidatingWebhookConfiguration points at
pub const VALIDATE_PATH: &str = "/validate";

/// Shared state for webhook handlers
pub struct WebhookState {
    /// Readiness and metrics
    pub health: Arc<HealthState>,
    /// Receiver of decision audit events
    pub audit: Arc<dyn AuditSink>,
}

impl WebhookState {
    /// State that audits through `tracing`
    pub fn new(health: Arc<HealthState>) -> Self {
        Self::with_audit(health, Arc::new(TracingAuditSink))
    }

    /// State with an explicit audit sink
    pub fn with_audit(health: Arc<HealthState>, audit: Arc<dyn AuditSink>) -> Self {
        Self { health, audit }
    }
}

/// Create the webhook router
///
/// Bodies larger than `max_body_bytes` are refused with 413 before decoding.
pub fn create_webhook_router(state: Arc<WebhookState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(VALIDATE_PATH, post(validate))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Validate container registries of a Pod or Deployment
async fn validate(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let request = match review::decode(&body, content_type) {
        Ok(request) => request,
        Err(e) => return reject(&state, None, e),
    };

    debug!(
        uid = %request.uid,
        kind = %request.kind.kind,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = %request.name,
        "Processing admission request"
    );

    match answer(&state, &request) {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response(),
        Err(e) => reject(&state, Some(&request.uid), e),
    }
}

/// Produce the encoded AdmissionReview answering `request`.
///
/// Policy denials are successful answers; only protocol failures are errors.
pub fn answer(state: &WebhookState, request: &AdmissionRequest<DynamicObject>) -> Result<Vec<u8>> {
    let started = Instant::now();

    let kind: ResourceKind = request.kind.kind.parse()?;
    let images = kind.images(review::object(request)?)?;
    let verdict = evaluate_images(images.iter().map(String::as_str));

    let response = verdict.clone().apply(review::respond_to(request));
    let body = review::encode(response, request)?;

    state.audit.decision(&DecisionRecord {
        uid: &request.uid,
        kind,
        namespace: request.namespace.as_deref(),
        name: &request.name,
        images: &images,
        verdict: &verdict,
    });
    state.health.metrics.record_decision(
        kind.as_str(),
        verdict.allowed,
        verdict.warnings.len(),
        started.elapsed().as_secs_f64(),
    );

    Ok(body)
}

fn reject(state: &WebhookState, uid: Option<&str>, error: AdmissionError) -> Response {
    state.audit.rejected(uid, &error);
    state.health.metrics.record_error(error.reason());
    error.into_response()
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0:`port` and serves the /validate endpoint until `handle`
/// is told to shut down. Readiness is reported once the listener is bound.
///
/// # Arguments
/// * `state` - Shared handler state
/// * `port` - Listen port
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
/// * `max_body_bytes` - Request body cap
/// * `handle` - Shutdown handle
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    port: u16,
    cert_path: &Path,
    key_path: &Path,
    max_body_bytes: usize,
    handle: Handle,
) -> std::result::Result<(), WebhookError> {
    let health = state.health.clone();
    let app = create_webhook_router(state, max_body_bytes);

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    // listening() resolves to None if the bind fails
    let readiness = {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Some(addr) = handle.listening().await {
                info!(%addr, path = VALIDATE_PATH, "Webhook server listening with TLS");
                health.set_ready(true).await;
            }
        })
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let served = axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await;
    readiness.abort();
    served?;

    Ok(())
}

/// Stop accepting connections and wait up to `grace` for `server` to drain.
///
/// Returns `false` if the server task was still running when the grace
/// period ran out.
pub async fn shutdown_webhook_server(
    handle: &Handle,
    server: JoinHandle<()>,
    grace: Duration,
) -> bool {
    handle.graceful_shutdown(Some(grace));
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Webhook server task panicked: {}", e);
            true
        }
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Webhook server did not drain in time");
            false
        }
    }
}
