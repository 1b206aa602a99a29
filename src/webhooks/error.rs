//! Error types for the admission path.
//!
//! Every variant is a protocol-level failure: no admission decision was
//! produced. Policy denials are not errors and never appear here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error raised while turning an HTTP request into an admission decision
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// Request did not declare `application/json`
    #[error("expected application/json content-type, got {0:?}")]
    UnsupportedContentType(String),

    /// Body is not an AdmissionReview carrying a request
    #[error("error getting admission review from request: {0}")]
    MalformedEnvelope(String),

    /// Resource kind outside the supported set
    #[error("unsupported resource kind {0:?}: expected one of Pod, Deployment")]
    UnsupportedKind(String),

    /// Embedded object does not decode as the declared kind
    #[error("error decoding raw object: {0}")]
    MalformedResource(String),

    /// Response envelope could not be serialized
    #[error("error marshalling response json: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AdmissionError {
    /// HTTP status the error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::UnsupportedContentType(_)
            | AdmissionError::MalformedEnvelope(_)
            | AdmissionError::UnsupportedKind(_)
            | AdmissionError::MalformedResource(_) => StatusCode::BAD_REQUEST,
            AdmissionError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short stable label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::UnsupportedContentType(_) => "UnsupportedContentType",
            AdmissionError::MalformedEnvelope(_) => "MalformedEnvelope",
            AdmissionError::UnsupportedKind(_) => "UnsupportedKind",
            AdmissionError::MalformedResource(_) => "MalformedResource",
            AdmissionError::Encode(_) => "EncodeError",
        }
    }

    /// Whether the caller sent something we cannot process
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Result type alias for admission operations
pub type Result<T> = std::result::Result<T, AdmissionError>;
