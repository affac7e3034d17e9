//! Registration pipeline stages.

use crate::domain::registration::audit::{AuditEvent, AuditSink};

/// Stages of a registration request, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistrationStage {
    ReceivedPayload,
    DomainNormalized,
    TokenValidated,
    FieldsValidated,
    Committed,
}

impl RegistrationStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReceivedPayload => "received_payload",
            Self::DomainNormalized => "domain_normalized",
            Self::TokenValidated => "token_validated",
            Self::FieldsValidated => "fields_validated",
            Self::Committed => "committed",
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::ReceivedPayload => Some(Self::DomainNormalized),
            Self::DomainNormalized => Some(Self::TokenValidated),
            Self::TokenValidated => Some(Self::FieldsValidated),
            Self::FieldsValidated => Some(Self::Committed),
            Self::Committed => None,
        }
    }
}

/// Tracks one request through the pipeline, auditing every transition.
pub(crate) struct RegistrationProgress<'a> {
    audit: &'a dyn AuditSink,
    domain: String,
    stage: RegistrationStage,
}

impl<'a> RegistrationProgress<'a> {
    pub(crate) fn start(audit: &'a dyn AuditSink, domain: &str) -> Self {
        let progress = Self {
            audit,
            domain: domain.to_string(),
            stage: RegistrationStage::ReceivedPayload,
        };

        progress.record_stage();

        progress
    }

    pub(crate) fn stage(&self) -> RegistrationStage {
        self.stage
    }

    /// Move to the next stage. Stages only move forward.
    pub(crate) fn advance(&mut self, domain: &str) {
        if let Some(next) = self.stage.next() {
            self.stage = next;
            domain.clone_into(&mut self.domain);
            self.record_stage();
        }
    }

    pub(crate) fn fail(&self, reason: impl Into<String>) {
        self.audit.record(AuditEvent::RegistrationFailed {
            domain: self.domain.clone(),
            stage: self.stage,
            reason: reason.into(),
        });
    }

    fn record_stage(&self) {
        self.audit.record(AuditEvent::StageEntered {
            domain: self.domain.clone(),
            stage: self.stage,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::test::helpers::RecordingAuditSink;

    use super::*;

    #[test]
    fn stages_are_ordered() {
        let mut stage = RegistrationStage::ReceivedPayload;
        let mut seen = vec![stage];

        while let Some(next) = stage.next() {
            assert!(next > stage, "{next:?} must follow {stage:?}");
            stage = next;
            seen.push(stage);
        }

        assert_eq!(seen.len(), 5);
        assert_eq!(stage, RegistrationStage::Committed);
    }

    #[test]
    fn progress_audits_each_transition_and_failure() {
        let audit = RecordingAuditSink::default();
        let mut progress = RegistrationProgress::start(&audit, "raw.example.com");

        progress.advance("example.com");
        progress.fail("claim token has expired");

        assert_eq!(progress.stage(), RegistrationStage::DomainNormalized);
        assert_eq!(
            audit.events(),
            vec![
                AuditEvent::StageEntered {
                    domain: "raw.example.com".to_string(),
                    stage: RegistrationStage::ReceivedPayload,
                },
                AuditEvent::StageEntered {
                    domain: "example.com".to_string(),
                    stage: RegistrationStage::DomainNormalized,
                },
                AuditEvent::RegistrationFailed {
                    domain: "example.com".to_string(),
                    stage: RegistrationStage::DomainNormalized,
                    reason: "claim token has expired".to_string(),
                },
            ]
        );
    }

    #[test]
    fn advance_past_committed_is_a_no_op() {
        let audit = RecordingAuditSink::default();
        let mut progress = RegistrationProgress::start(&audit, "example.com");

        for _ in 0..6 {
            progress.advance("example.com");
        }

        assert_eq!(progress.stage(), RegistrationStage::Committed);
        assert_eq!(audit.events().len(), 5);
    }
}
