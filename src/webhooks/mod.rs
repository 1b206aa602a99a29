//! Validating admission webhook for container image registries.
//!
//! Request path, leaf modules first:
//! - `policies`: per-image registry policy and short-circuit aggregation
//! - `extract`: container images of a Pod or Deployment
//! - `review`: AdmissionReview envelope decode/encode
//! - `server`: HTTP dispatch, status mapping, TLS listener
//!
//! `error` holds the protocol failure taxonomy and `audit` the decision sink
//! the dispatcher reports to.

pub mod audit;
pub mod error;
pub mod extract;
pub mod policies;
pub mod review;
mod server;

pub use audit::{AuditSink, DecisionRecord, TracingAuditSink};
pub use error::AdmissionError;
pub use extract::{ResourceKind, extract_images};
pub use policies::{Decision, Verdict, evaluate_images};
pub use server::{
    VALIDATE_PATH, WebhookError, WebhookState, answer, create_webhook_router, run_webhook_server,
    shutdown_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
