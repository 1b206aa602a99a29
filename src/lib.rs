//! image-registry-webhook library crate
//!
//! This module exports the admission webhook, its configuration, and the
//! health/metrics server.

pub mod config;
pub mod health;
pub mod webhooks;

pub use config::{Config, LogFormat};
pub use health::HealthState;
pub use webhooks::{WebhookError, WebhookState, run_webhook_server};
