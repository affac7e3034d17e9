//! Registration audit trail.
//!
//! Every verification and provisioning step is reported to an [`AuditSink`].
//! Recording is synchronous and infallible so auditing can never fail or delay
//! a request.

use std::fmt::Debug;

use tracing::{info, warn};

use crate::domain::registration::{
    handshake::{AttemptOutcome, Scheme},
    stage::RegistrationStage,
};

/// Raw peer responses are cut to this many bytes before they are recorded.
pub const MAX_AUDITED_RESPONSE_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    VerificationRequested {
        domain: String,
        host: String,
        remote_addr: Option<String>,
    },
    RegistrationRequested {
        domain: String,
        host: String,
        remote_addr: Option<String>,
    },
    HandshakeAttempted {
        domain: String,
        source: String,
        challenge: String,
        scheme: Scheme,
        url: String,
        status: Option<u16>,
        outcome: AttemptOutcome,
        expected_token: String,
        received_token: Option<String>,
        response: String,
        message: String,
    },
    HandshakeSucceeded {
        domain: String,
        scheme: Scheme,
    },
    HandshakeFailed {
        domain: String,
        attempts: usize,
    },
    ClaimTokenIssued {
        domain: String,
        expires_at: i64,
    },
    ClaimTokenRejected {
        domain: String,
        reason: &'static str,
    },
    ChallengeAnswered {
        domain: String,
        source: String,
        challenge: String,
    },
    StageEntered {
        domain: String,
        stage: RegistrationStage,
    },
    RegistrationFailed {
        domain: String,
        stage: RegistrationStage,
        reason: String,
    },
    RegistrationCommitted {
        domain: String,
        site_uuid: String,
        admin_uuid: String,
        role_name: String,
    },
}

impl AuditEvent {
    /// Short event name, used as the `event` field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::VerificationRequested { .. } => "verification_requested",
            Self::RegistrationRequested { .. } => "registration_requested",
            Self::HandshakeAttempted { .. } => "handshake_attempted",
            Self::HandshakeSucceeded { .. } => "handshake_succeeded",
            Self::HandshakeFailed { .. } => "handshake_failed",
            Self::ClaimTokenIssued { .. } => "claim_token_issued",
            Self::ClaimTokenRejected { .. } => "claim_token_rejected",
            Self::ChallengeAnswered { .. } => "challenge_answered",
            Self::StageEntered { .. } => "stage_entered",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::RegistrationCommitted { .. } => "registration_committed",
        }
    }
}

/// Receives audit events.
pub trait AuditSink: Debug + Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes audit events as `tracing` events on the `sitebind::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let name = event.name();

        match event {
            AuditEvent::VerificationRequested {
                domain,
                host,
                remote_addr,
            } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %host,
                remote_addr = remote_addr.as_deref().unwrap_or("-"),
                "domain verification requested"
            ),
            AuditEvent::RegistrationRequested {
                domain,
                host,
                remote_addr,
            } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %host,
                remote_addr = remote_addr.as_deref().unwrap_or("-"),
                "site registration requested"
            ),
            AuditEvent::HandshakeAttempted {
                domain,
                source,
                challenge,
                scheme,
                url,
                status,
                outcome,
                expected_token,
                received_token,
                response,
                message,
            } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %source,
                %challenge,
                scheme = scheme.as_str(),
                %url,
                status,
                outcome = outcome.as_str(),
                %expected_token,
                received_token = received_token.as_deref().unwrap_or("-"),
                %response,
                %message,
                "handshake attempt"
            ),
            AuditEvent::HandshakeSucceeded { domain, scheme } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                scheme = scheme.as_str(),
                "domain verified"
            ),
            AuditEvent::HandshakeFailed { domain, attempts } => warn!(
                target: "sitebind::audit",
                event = name,
                %domain,
                attempts,
                "domain could not be verified"
            ),
            AuditEvent::ClaimTokenIssued { domain, expires_at } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                expires_at,
                "claim token issued"
            ),
            AuditEvent::ClaimTokenRejected { domain, reason } => warn!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %reason,
                "claim token rejected"
            ),
            AuditEvent::ChallengeAnswered {
                domain,
                source,
                challenge,
            } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %source,
                %challenge,
                "verification challenge answered"
            ),
            AuditEvent::StageEntered { domain, stage } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                stage = stage.as_str(),
                "registration stage"
            ),
            AuditEvent::RegistrationFailed {
                domain,
                stage,
                reason,
            } => warn!(
                target: "sitebind::audit",
                event = name,
                %domain,
                stage = stage.as_str(),
                %reason,
                "registration failed"
            ),
            AuditEvent::RegistrationCommitted {
                domain,
                site_uuid,
                admin_uuid,
                role_name,
            } => info!(
                target: "sitebind::audit",
                event = name,
                %domain,
                %site_uuid,
                %admin_uuid,
                %role_name,
                "site provisioned"
            ),
        }
    }
}

/// Cut `raw` to at most [`MAX_AUDITED_RESPONSE_BYTES`] on a char boundary.
#[must_use]
pub fn truncate_response(raw: &str) -> String {
    if raw.len() <= MAX_AUDITED_RESPONSE_BYTES {
        return raw.to_string();
    }

    let mut end = MAX_AUDITED_RESPONSE_BYTES;

    while !raw.is_char_boundary(end) {
        end -= 1;
    }

    raw.get(..end).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_responses_are_kept() {
        assert_eq!(truncate_response("{\"token\":\"x\"}"), "{\"token\":\"x\"}");
    }

    #[test]
    fn long_responses_are_cut_on_char_boundary() {
        let ascii = "a".repeat(5000);
        let multibyte = format!("a{}", "é".repeat(2000));

        assert_eq!(truncate_response(&ascii).len(), MAX_AUDITED_RESPONSE_BYTES);

        let cut = truncate_response(&multibyte);

        assert!(cut.len() <= MAX_AUDITED_RESPONSE_BYTES);
        assert!(cut.len() >= MAX_AUDITED_RESPONSE_BYTES - 1);
    }

    #[test]
    fn tracing_sink_accepts_every_event() {
        let sink = TracingAuditSink;

        sink.record(AuditEvent::HandshakeFailed {
            domain: "example.com".to_string(),
            attempts: 2,
        });
        sink.record(AuditEvent::StageEntered {
            domain: "example.com".to_string(),
            stage: RegistrationStage::Committed,
        });
    }
}
