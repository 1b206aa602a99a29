//! Decision audit trail.
//!
//! The dispatch handler reports every decision and every rejected request to
//! an [`AuditSink`] held in its state. [`TracingAuditSink`] is the production
//! sink; tests substitute a recording one.

use tracing::{error, info, warn};

use super::error::AdmissionError;
use super::extract::ResourceKind;
use super::policies::Verdict;

/// One admission decision as reported to the audit sink
#[derive(Debug, Clone, Copy)]
pub struct DecisionRecord<'a> {
    /// Request uid the decision answers
    pub uid: &'a str,
    /// Kind of the inspected resource
    pub kind: ResourceKind,
    /// Namespace of the inspected resource, when namespaced
    pub namespace: Option<&'a str>,
    /// Name of the inspected resource (empty when generated server side)
    pub name: &'a str,
    /// Container images in evaluation order
    pub images: &'a [String],
    /// The aggregated outcome
    pub verdict: &'a Verdict,
}

/// Receiver of admission audit events
pub trait AuditSink: Send + Sync {
    /// A decision was produced and is about to be returned
    fn decision(&self, record: &DecisionRecord<'_>);

    /// A request failed before a decision was produced
    fn rejected(&self, uid: Option<&str>, error: &AdmissionError);
}

/// Audit sink that emits structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn decision(&self, record: &DecisionRecord<'_>) {
        let verdict = record.verdict;
        if verdict.allowed {
            info!(
                uid = %record.uid,
                kind = %record.kind,
                namespace = ?record.namespace,
                name = %record.name,
                images = ?record.images,
                warnings = ?verdict.warnings,
                "Admission request allowed"
            );
        } else {
            warn!(
                uid = %record.uid,
                kind = %record.kind,
                namespace = ?record.namespace,
                name = %record.name,
                images = ?record.images,
                message = ?verdict.message,
                "Admission request denied"
            );
        }
    }

    fn rejected(&self, uid: Option<&str>, error: &AdmissionError) {
        if error.is_client_error() {
            warn!(uid = ?uid, reason = error.reason(), error = %error, "Rejected admission request");
        } else {
            error!(uid = ?uid, reason = error.reason(), error = %error, "Failed to answer admission request");
        }
    }
}
