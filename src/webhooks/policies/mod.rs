//! Admission policies for container images.
//!
//! A [`Decision`] is produced per container by [`registry::evaluate`];
//! [`evaluate_images`] folds the per-container decisions of one resource into
//! a single [`Verdict`]. The fold is all-or-nothing: the first denial wins and
//! anything gathered before it is dropped.

pub mod registry;

use kube::core::admission::AdmissionResponse;

/// Outcome of evaluating a single container image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the image is admitted
    pub allowed: bool,
    /// Warning to surface to the client (allowed images only)
    pub warning: Option<String>,
    /// Reason for denial (if not allowed)
    pub denial_message: Option<String>,
}

impl Decision {
    /// Create an allowed decision
    pub fn allow() -> Self {
        Self {
            allowed: true,
            warning: None,
            denial_message: None,
        }
    }

    /// Create an allowed decision that carries a warning
    pub fn allow_with_warning(warning: impl Into<String>) -> Self {
        Self {
            allowed: true,
            warning: Some(warning.into()),
            denial_message: None,
        }
    }

    /// Create a denied decision
    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            warning: None,
            denial_message: Some(message.into()),
        }
    }
}

/// Aggregate admission outcome for one resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    /// Whether the resource is admitted
    pub allowed: bool,
    /// Warnings from every allowed container, in evaluation order
    pub warnings: Vec<String>,
    /// Message of the denying container
    pub message: Option<String>,
}

impl Verdict {
    /// Verdict for a single denial
    fn denied(message: Option<String>) -> Self {
        Self {
            allowed: false,
            warnings: Vec::new(),
            message,
        }
    }

    /// Apply this verdict to a response already correlated with its request
    pub fn apply(self, response: AdmissionResponse) -> AdmissionResponse {
        let mut response = match self.message {
            Some(message) if !self.allowed => response.deny(message),
            _ => response,
        };
        response.allowed = self.allowed;
        if !self.warnings.is_empty() {
            response.warnings = Some(self.warnings);
        }
        response
    }
}

/// Evaluate container images in order, stopping at the first denial.
///
/// A resource with no containers is not admitted and carries no message.
pub fn evaluate_images<'a, I>(images: I) -> Verdict
where
    I: IntoIterator<Item = &'a str>,
{
    let mut verdict = Verdict::denied(None);

    for image in images {
        let decision = registry::evaluate(image);
        if !decision.allowed {
            return Verdict::denied(decision.denial_message);
        }
        verdict.allowed = true;
        if let Some(warning) = decision.warning {
            verdict.warnings.push(warning);
        }
    }

    verdict
}
