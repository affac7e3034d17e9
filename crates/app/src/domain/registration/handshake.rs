//! Domain-ownership handshake.
//!
//! The platform sends a fresh challenge to
//! `{scheme}://{domain}/site/verification` and expects back the proof token
//! for `(domain, source, challenge)`. Only a host running a responder with the
//! shared signing secret can produce it. `https` is tried before `http`; any
//! single attempt may fail without failing the handshake.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::Arc,
};

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::domain::registration::{
    audit::{AuditEvent, AuditSink, truncate_response},
    candidate::CandidateDomain,
    proof::{ProofTokenService, generate_challenge},
    transport::{HandshakeTransport, TransportError},
};

/// Path every verifiable site serves its responder on.
pub const VERIFICATION_PATH: &str = "/site/verification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    /// Attempt order.
    pub const ORDER: [Self; 2] = [Self::Https, Self::Http];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    Verified,
    TokenMismatch,
    MalformedResponse,
    Unreachable,
}

impl AttemptOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::TokenMismatch => "token_mismatch",
            Self::MalformedResponse => "malformed_response",
            Self::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeAttempt {
    pub scheme: Scheme,
    pub url: String,
    pub status: Option<u16>,
    pub outcome: AttemptOutcome,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeReport {
    pub domain: String,
    pub source: String,
    pub challenge: String,
    pub attempts: Vec<HandshakeAttempt>,
}

impl HandshakeReport {
    /// Scheme of the attempt that verified the domain.
    #[must_use]
    pub fn verified_scheme(&self) -> Option<Scheme> {
        self.attempts
            .iter()
            .find(|attempt| attempt.outcome == AttemptOutcome::Verified)
            .map(|attempt| attempt.scheme)
    }
}

/// Every attempt failed. Callers only show the display message; the report is
/// for logs and diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("domain could not be verified")]
pub struct HandshakeError {
    pub report: HandshakeReport,
}

#[derive(Clone)]
pub struct HandshakeClient {
    transport: Arc<dyn HandshakeTransport>,
    proofs: ProofTokenService,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for HandshakeClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HandshakeClient")
            .field("proofs", &self.proofs)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl HandshakeClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn HandshakeTransport>,
        proofs: ProofTokenService,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            transport,
            proofs,
            audit,
        }
    }

    /// Run the handshake against `domain` with a fresh challenge.
    ///
    /// `source` is the host the platform itself was reached on.
    pub async fn verify(
        &self,
        domain: &CandidateDomain,
        source: &str,
    ) -> Result<HandshakeReport, HandshakeError> {
        self.verify_with_challenge(domain, source, &generate_challenge())
            .await
    }

    #[tracing::instrument(
        name = "registration.handshake.verify",
        skip(self, challenge),
        fields(domain = %domain, source = %source, verified_scheme = tracing::field::Empty),
    )]
    pub async fn verify_with_challenge(
        &self,
        domain: &CandidateDomain,
        source: &str,
        challenge: &str,
    ) -> Result<HandshakeReport, HandshakeError> {
        let source = source.to_ascii_lowercase();
        let expected = self.proofs.token(domain.as_str(), &source, challenge);

        let mut report = HandshakeReport {
            domain: domain.to_string(),
            source: source.clone(),
            challenge: challenge.to_string(),
            attempts: Vec::with_capacity(Scheme::ORDER.len()),
        };

        for scheme in Scheme::ORDER {
            let attempt = self
                .attempt(scheme, domain, &source, challenge, &expected)
                .await;
            let verified = attempt.outcome == AttemptOutcome::Verified;

            report.attempts.push(attempt);

            if verified {
                tracing::Span::current().record("verified_scheme", scheme.as_str());

                self.audit.record(AuditEvent::HandshakeSucceeded {
                    domain: domain.to_string(),
                    scheme,
                });

                return Ok(report);
            }
        }

        self.audit.record(AuditEvent::HandshakeFailed {
            domain: domain.to_string(),
            attempts: report.attempts.len(),
        });

        Err(HandshakeError { report })
    }

    async fn attempt(
        &self,
        scheme: Scheme,
        domain: &CandidateDomain,
        source: &str,
        challenge: &str,
        expected: &str,
    ) -> HandshakeAttempt {
        let base = format!("{scheme}://{domain}{VERIFICATION_PATH}");

        let url = match Url::parse_with_params(
            &base,
            &[("source", source), ("challenge", challenge)],
        ) {
            Ok(url) => url,
            Err(error) => {
                return self.finish(
                    HandshakeAttempt {
                        scheme,
                        url: base,
                        status: None,
                        outcome: AttemptOutcome::Unreachable,
                        message: format!("Invalid verification URL: {error}"),
                    },
                    domain,
                    source,
                    challenge,
                    expected,
                    None,
                    "",
                );
            }
        };

        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(error) => {
                let outcome = match &error {
                    TransportError::BodyTooLarge { .. } => AttemptOutcome::MalformedResponse,
                    _ => AttemptOutcome::Unreachable,
                };

                return self.finish(
                    HandshakeAttempt {
                        scheme,
                        url: url.to_string(),
                        status: None,
                        outcome,
                        message: error.to_string(),
                    },
                    domain,
                    source,
                    challenge,
                    expected,
                    None,
                    "",
                );
            }
        };

        let received = received_token(&response.body);

        let (outcome, message) = match received.as_deref() {
            None => (
                AttemptOutcome::MalformedResponse,
                "Response did not contain a token".to_string(),
            ),
            Some(token) if self.proofs.verify(domain.as_str(), source, challenge, token) => {
                (AttemptOutcome::Verified, "Verified".to_string())
            }
            Some(_) => (AttemptOutcome::TokenMismatch, "Token mismatch".to_string()),
        };

        self.finish(
            HandshakeAttempt {
                scheme,
                url: url.to_string(),
                status: Some(response.status),
                outcome,
                message,
            },
            domain,
            source,
            challenge,
            expected,
            received,
            &response.body,
        )
    }

    #[expect(
        clippy::too_many_arguments,
        reason = "audit record carries the full attempt context"
    )]
    fn finish(
        &self,
        attempt: HandshakeAttempt,
        domain: &CandidateDomain,
        source: &str,
        challenge: &str,
        expected: &str,
        received: Option<String>,
        raw_response: &str,
    ) -> HandshakeAttempt {
        self.audit.record(AuditEvent::HandshakeAttempted {
            domain: domain.to_string(),
            source: source.to_string(),
            challenge: challenge.to_string(),
            scheme: attempt.scheme,
            url: attempt.url.clone(),
            status: attempt.status,
            outcome: attempt.outcome,
            expected_token: expected.to_string(),
            received_token: received,
            response: truncate_response(raw_response),
            message: attempt.message.clone(),
        });

        attempt
    }
}

fn received_token(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("token")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use testresult::TestResult;

    use crate::{
        domain::registration::transport::{
            MAX_RESPONSE_BYTES, MockHandshakeTransport, TransportResponse,
        },
        test::helpers::{RecordingAuditSink, responder_reply, test_signer},
    };

    use super::*;

    const SOURCE: &str = "platform.example.net";

    fn client(
        transport: MockHandshakeTransport,
        audit: &Arc<RecordingAuditSink>,
    ) -> Result<HandshakeClient, crate::signing::SignerError> {
        Ok(HandshakeClient::new(
            Arc::new(transport),
            ProofTokenService::new(test_signer()?),
            audit.clone(),
        ))
    }

    fn domain() -> CandidateDomain {
        CandidateDomain::normalize("shop.example.com")
    }

    #[tokio::test]
    async fn verifies_over_https_and_skips_http() -> TestResult {
        let proofs = ProofTokenService::new(test_signer()?);
        let mut transport = MockHandshakeTransport::new();

        transport
            .expect_get()
            .withf(|url| url.scheme() == "https")
            .times(1)
            .returning(move |url| Ok(responder_reply(&proofs, url)));

        let audit = Arc::new(RecordingAuditSink::default());
        let report = client(transport, &audit)?
            .verify_with_challenge(&domain(), "Platform.Example.NET", "c0ffee")
            .await?;

        assert_eq!(report.verified_scheme(), Some(Scheme::Https));
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.source, SOURCE);
        assert_eq!(
            report.attempts.first().map(|attempt| attempt.url.as_str()),
            Some("https://shop.example.com/site/verification?source=platform.example.net&challenge=c0ffee")
        );
        assert!(audit.events().contains(&AuditEvent::HandshakeSucceeded {
            domain: "shop.example.com".to_string(),
            scheme: Scheme::Https,
        }));

        Ok(())
    }

    #[tokio::test]
    async fn explicit_default_port_targets_the_bare_host_on_both_schemes() -> TestResult {
        let proofs = ProofTokenService::new(test_signer()?);
        let mut transport = MockHandshakeTransport::new();
        let mut sequence = Sequence::new();

        transport
            .expect_get()
            .withf(|url| {
                url.as_str().starts_with("https://shop.example.com/site/verification?")
                    && url.port().is_none()
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(TransportError::Timeout));

        transport
            .expect_get()
            .withf(|url| {
                url.as_str().starts_with("http://shop.example.com/site/verification?")
                    && url.port().is_none()
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |url| Ok(responder_reply(&proofs, url)));

        let audit = Arc::new(RecordingAuditSink::default());
        let report = client(transport, &audit)?
            .verify(&CandidateDomain::normalize("https://shop.example.com:443/"), SOURCE)
            .await?;

        assert_eq!(report.domain, "shop.example.com");
        assert_eq!(report.verified_scheme(), Some(Scheme::Http));

        Ok(())
    }

    #[tokio::test]
    async fn http_only_domain_is_tried_over_https_first() -> TestResult {
        let proofs = ProofTokenService::new(test_signer()?);
        let mut transport = MockHandshakeTransport::new();
        let mut sequence = Sequence::new();

        transport
            .expect_get()
            .withf(|url| url.scheme() == "https")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(TransportError::Connect("connection refused".to_string())));

        transport
            .expect_get()
            .withf(|url| url.scheme() == "http")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |url| Ok(responder_reply(&proofs, url)));

        let audit = Arc::new(RecordingAuditSink::default());
        let report = client(transport, &audit)?
            .verify(&domain(), SOURCE)
            .await?;

        let outcomes: Vec<_> = report
            .attempts
            .iter()
            .map(|attempt| (attempt.scheme, attempt.outcome))
            .collect();

        assert_eq!(
            outcomes,
            [
                (Scheme::Https, AttemptOutcome::Unreachable),
                (Scheme::Http, AttemptOutcome::Verified)
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn proof_for_another_source_is_a_mismatch_on_every_scheme() -> TestResult {
        let proofs = ProofTokenService::new(test_signer()?);
        let mut transport = MockHandshakeTransport::new();

        transport.expect_get().times(2).returning(move |url| {
            let answer = proofs.respond(
                url.host_str().unwrap_or_default(),
                "attacker.example.org",
                &url.query_pairs()
                    .find(|(key, _)| key == "challenge")
                    .map(|(_, value)| value.into_owned())
                    .unwrap_or_default(),
            );

            Ok(TransportResponse {
                status: 200,
                body: serde_json::json!({ "token": answer.token }).to_string(),
            })
        });

        let audit = Arc::new(RecordingAuditSink::default());
        let error = client(transport, &audit)?
            .verify(&domain(), SOURCE)
            .await
            .err()
            .ok_or("handshake should fail")?;

        assert_eq!(error.to_string(), "domain could not be verified");
        assert!(
            error
                .report
                .attempts
                .iter()
                .all(|attempt| attempt.message == "Token mismatch"
                    && attempt.outcome == AttemptOutcome::TokenMismatch)
        );
        assert!(audit.events().contains(&AuditEvent::HandshakeFailed {
            domain: "shop.example.com".to_string(),
            attempts: 2,
        }));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_bodies_and_error_statuses_fail_each_attempt() -> TestResult {
        let mut transport = MockHandshakeTransport::new();
        let mut sequence = Sequence::new();

        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Ok(TransportResponse {
                    status: 404,
                    body: "<html>not found</html>".to_string(),
                })
            });

        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Ok(TransportResponse {
                    status: 200,
                    body: r#"{"token": 42}"#.to_string(),
                })
            });

        let audit = Arc::new(RecordingAuditSink::default());
        let error = client(transport, &audit)?
            .verify(&domain(), SOURCE)
            .await
            .err()
            .ok_or("handshake should fail")?;

        let statuses: Vec<_> = error.report.attempts.iter().map(|a| a.status).collect();

        assert_eq!(statuses, [Some(404), Some(200)]);
        assert!(
            error
                .report
                .attempts
                .iter()
                .all(|attempt| attempt.outcome == AttemptOutcome::MalformedResponse)
        );

        Ok(())
    }

    #[tokio::test]
    async fn oversized_responses_are_malformed_not_unreachable() -> TestResult {
        let mut transport = MockHandshakeTransport::new();

        transport.expect_get().times(2).returning(|_| {
            Err(TransportError::BodyTooLarge {
                limit: MAX_RESPONSE_BYTES,
            })
        });

        let audit = Arc::new(RecordingAuditSink::default());
        let error = client(transport, &audit)?
            .verify(&domain(), SOURCE)
            .await
            .err()
            .ok_or("handshake should fail")?;

        assert!(
            error.report.attempts.iter().all(|attempt| {
                attempt.outcome == AttemptOutcome::MalformedResponse
                    && attempt.message == "response body exceeds 65536 bytes"
            }),
            "unexpected attempts: {:?}",
            error.report.attempts
        );

        Ok(())
    }

    #[tokio::test]
    async fn every_attempt_is_audited_with_expected_and_received_tokens() -> TestResult {
        let mut transport = MockHandshakeTransport::new();

        transport.expect_get().times(2).returning(|_| {
            Ok(TransportResponse {
                status: 200,
                body: format!(r#"{{"token":"bogus","padding":"{}"}}"#, "x".repeat(4096)),
            })
        });

        let audit = Arc::new(RecordingAuditSink::default());
        let expected = ProofTokenService::new(test_signer()?).token(
            "shop.example.com",
            SOURCE,
            "c0ffee",
        );

        let result = client(transport, &audit)?
            .verify_with_challenge(&domain(), SOURCE, "c0ffee")
            .await;

        assert!(result.is_err());

        let attempts: Vec<_> = audit
            .events()
            .into_iter()
            .filter_map(|event| match event {
                AuditEvent::HandshakeAttempted {
                    scheme,
                    expected_token,
                    received_token,
                    response,
                    challenge,
                    ..
                } => Some((scheme, expected_token, received_token, response.len(), challenge)),
                _ => None,
            })
            .collect();

        assert_eq!(attempts.len(), 2);

        for (_, expected_token, received_token, response_len, challenge) in &attempts {
            assert_eq!(expected_token, &expected);
            assert_eq!(received_token.as_deref(), Some("bogus"));
            assert_eq!(*response_len, crate::domain::registration::audit::MAX_AUDITED_RESPONSE_BYTES);
            assert_eq!(challenge, "c0ffee");
        }

        Ok(())
    }
}
