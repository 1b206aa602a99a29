//! AdmissionReview envelope codec.
//!
//! Decoding checks the declared content type and the envelope shape before
//! anything else looks at the body. Encoding wraps a response in a review
//! whose `apiVersion`/`kind` and `response.uid` come from the request: the API
//! server drops responses that do not match on both.

use kube::core::DynamicObject;
use kube::core::admission::{
    AdmissionRequest, AdmissionResponse, AdmissionReview, ConvertAdmissionReviewError,
};
use serde_json::{Map, Value, json};

use super::error::{AdmissionError, Result};

/// The only accepted request content type
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Decode an AdmissionReview request from an HTTP body.
///
/// `content_type` must be exactly `application/json`. Beyond the envelope
/// `apiVersion`/`kind`, the request only needs `uid`, `kind.kind` and
/// `object`; the remaining request fields default when absent.
pub fn decode(body: &[u8], content_type: Option<&str>) -> Result<AdmissionRequest<DynamicObject>> {
    match content_type {
        Some(JSON_CONTENT_TYPE) => {}
        other => {
            return Err(AdmissionError::UnsupportedContentType(
                other.unwrap_or_default().to_string(),
            ));
        }
    }

    let mut envelope: Value = serde_json::from_slice(body)
        .map_err(|e| AdmissionError::MalformedEnvelope(e.to_string()))?;
    if let Some(request) = envelope.get_mut("request").and_then(Value::as_object_mut) {
        fill_request_defaults(request);
    }

    let review: AdmissionReview<DynamicObject> = serde_json::from_value(envelope)
        .map_err(|e| AdmissionError::MalformedEnvelope(e.to_string()))?;

    review
        .try_into()
        .map_err(|e: ConvertAdmissionReviewError| AdmissionError::MalformedEnvelope(e.to_string()))
}

/// Fill the request fields the policy never reads.
///
/// A missing `operation` is taken as `CREATE`.
fn fill_request_defaults(request: &mut Map<String, Value>) {
    if let Some(kind) = request.get_mut("kind").and_then(Value::as_object_mut) {
        kind.entry("group").or_insert_with(|| json!(""));
        kind.entry("version").or_insert_with(|| json!(""));
    }
    request.entry("name").or_insert_with(|| json!(""));
    request
        .entry("resource")
        .or_insert_with(|| json!({"group": "", "version": "", "resource": ""}));
    request.entry("operation").or_insert_with(|| json!("CREATE"));
    request.entry("userInfo").or_insert_with(|| json!({}));
}

/// The embedded object of a request as plain JSON
pub fn object(request: &AdmissionRequest<DynamicObject>) -> Result<Value> {
    let object = request
        .object
        .as_ref()
        .ok_or_else(|| AdmissionError::MalformedResource("request has no object".to_string()))?;
    serde_json::to_value(object).map_err(|e| AdmissionError::MalformedResource(e.to_string()))
}

/// Response skeleton correlated with `request`: same uid and envelope identity
pub fn respond_to(request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
    AdmissionResponse::from(request)
}

/// Encode `response` as the AdmissionReview answering `request`
pub fn encode(
    mut response: AdmissionResponse,
    request: &AdmissionRequest<DynamicObject>,
) -> Result<Vec<u8>> {
    response.uid.clone_from(&request.uid);
    response.types = request.types.clone();
    Ok(serde_json::to_vec(&response.into_review())?)
}

/// Decode the response section of an encoded AdmissionReview
pub fn decode_response(body: &[u8]) -> Result<AdmissionReview<DynamicObject>> {
    let review: AdmissionReview<DynamicObject> = serde_json::from_slice(body)
        .map_err(|e| AdmissionError::MalformedEnvelope(e.to_string()))?;
    if review.response.is_none() {
        return Err(AdmissionError::MalformedEnvelope(
            "admission review has no response".to_string(),
        ));
    }
    Ok(review)
}
