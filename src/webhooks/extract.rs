//! Container image extraction.
//!
//! Each supported kind decodes the embedded object into its typed
//! `k8s-openapi` form and yields the container images in declaration order.
//! Unknown fields are ignored by those types, so newer API servers do not
//! break decoding; structurally wrong payloads still fail.

use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{AdmissionError, Result};

/// Resource kinds the webhook knows how to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// core/v1 Pod
    Pod,
    /// apps/v1 Deployment
    Deployment,
}

impl ResourceKind {
    /// All supported kinds
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Pod, ResourceKind::Deployment];

    /// Kind name as it appears in `request.kind.kind`
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
        }
    }

    /// Container images of `object`, decoded as this kind
    pub fn images(&self, object: Value) -> Result<Vec<String>> {
        let spec = match self {
            ResourceKind::Pod => decode::<Pod>(object)?.spec,
            ResourceKind::Deployment => decode::<Deployment>(object)?
                .spec
                .and_then(|spec| spec.template.spec),
        };
        Ok(spec.map(container_images).unwrap_or_default())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AdmissionError;

    fn from_str(kind: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| AdmissionError::UnsupportedKind(kind.to_string()))
    }
}

/// Resolve `kind` and extract the container images of `object`
pub fn extract_images(kind: &str, object: Value) -> Result<Vec<String>> {
    kind.parse::<ResourceKind>()?.images(object)
}

fn decode<T: DeserializeOwned>(object: Value) -> Result<T> {
    serde_json::from_value(object).map_err(|e| AdmissionError::MalformedResource(e.to_string()))
}

// A container with no image is evaluated as the empty reference
fn container_images(spec: PodSpec) -> Vec<String> {
    spec.containers
        .into_iter()
        .map(|Container { image, .. }| image.unwrap_or_default())
        .collect()
}
