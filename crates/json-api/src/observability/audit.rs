//! Audit sink that feeds registration metrics.

use sitebind_app::domain::registration::audit::{AuditEvent, AuditSink, TracingAuditSink};

use super::metrics;

/// Counts handshake, claim token and registration outcomes, then hands the
/// event on to the tracing audit log.
#[derive(Debug, Default)]
pub(crate) struct MetricsAuditSink {
    inner: TracingAuditSink,
}

impl AuditSink for MetricsAuditSink {
    fn record(&self, event: AuditEvent) {
        match &event {
            AuditEvent::HandshakeAttempted {
                scheme, outcome, ..
            } => metrics::observe_handshake_attempt(scheme.as_str(), outcome.as_str()),
            AuditEvent::ClaimTokenIssued { .. } => metrics::observe_claim_token("issued"),
            AuditEvent::ClaimTokenRejected { reason, .. } => metrics::observe_claim_token(reason),
            AuditEvent::RegistrationFailed { stage, .. } => {
                metrics::observe_registration("failed", stage.as_str());
            }
            AuditEvent::RegistrationCommitted { .. } => {
                metrics::observe_registration("committed", "committed");
            }
            AuditEvent::VerificationRequested { .. }
            | AuditEvent::RegistrationRequested { .. }
            | AuditEvent::HandshakeSucceeded { .. }
            | AuditEvent::HandshakeFailed { .. }
            | AuditEvent::ChallengeAnswered { .. }
            | AuditEvent::StageEntered { .. } => {}
        }

        self.inner.record(event);
    }
}
