//! Process configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! same binary works from a Deployment manifest or a shell.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 8443;
/// Default health/metrics server port
pub const HEALTH_PORT: u16 = 8080;
/// Default request body cap; the API server itself caps objects at 3 MiB
pub const MAX_BODY_BYTES: usize = 3 * 1024 * 1024;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Text,
}

/// Command-line configuration for the webhook process
#[derive(Debug, Clone, Parser)]
#[command(name = "image-registry-webhook", version, about)]
pub struct Config {
    /// Webhook server port
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = WEBHOOK_PORT)]
    pub port: u16,

    /// File containing the x509 certificate for HTTPS
    #[arg(long = "tlsCertFile", env = "TLS_CERT_FILE", default_value = WEBHOOK_CERT_PATH)]
    pub tls_cert_file: PathBuf,

    /// File containing the x509 private key for --tlsCertFile
    #[arg(long = "tlsKeyFile", env = "TLS_KEY_FILE", default_value = WEBHOOK_KEY_PATH)]
    pub tls_key_file: PathBuf,

    /// Port for /healthz, /readyz and /metrics (plain HTTP)
    #[arg(long, env = "HEALTH_PORT", default_value_t = HEALTH_PORT)]
    pub health_port: u16,

    /// Largest admission request body accepted, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Config {
    /// Paths of required TLS files that do not exist
    pub fn missing_tls_files(&self) -> Vec<&Path> {
        [self.tls_cert_file.as_path(), self.tls_key_file.as_path()]
            .into_iter()
            .filter(|path| !path.exists())
            .collect()
    }
}
