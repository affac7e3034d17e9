//! Test Helpers

use std::sync::{Mutex, PoisonError};

use reqwest::Url;

use crate::{
    domain::registration::{
        audit::{AuditEvent, AuditSink},
        proof::ProofTokenService,
        transport::{MockHandshakeTransport, TransportResponse},
    },
    signing::{Signer, SignerError, SigningSecret},
};

pub(crate) const TEST_SECRET: &str = "sitebind-test-secret-0123456789abcdef";

pub(crate) fn test_signer() -> Result<Signer, SignerError> {
    Signer::new(&SigningSecret::new(TEST_SECRET)?)
}

/// Keeps every audit event in memory.
#[derive(Debug, Default)]
pub(crate) struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub(crate) fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

fn query_value(url: &Url, key: &str) -> String {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn url_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();

    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// What a correctly configured responder on the URL's host would answer.
pub(crate) fn responder_reply(proofs: &ProofTokenService, url: &Url) -> TransportResponse {
    let answer = proofs.respond(
        &url_domain(url),
        &query_value(url, "source"),
        &query_value(url, "challenge"),
    );

    TransportResponse {
        status: 200,
        body: serde_json::json!({
            "token": answer.token,
            "domain": answer.domain,
            "source": answer.source,
            "challenge": answer.challenge,
            "payload": answer.payload,
            "algorithm": answer.algorithm,
        })
        .to_string(),
    }
}

/// Transport whose https attempt reaches a responder sharing the secret.
pub(crate) fn answering_transport(signer: &Signer) -> MockHandshakeTransport {
    let proofs = ProofTokenService::new(signer.clone());
    let mut transport = MockHandshakeTransport::new();

    transport
        .expect_get()
        .withf(|url| url.scheme() == "https")
        .times(1)
        .returning(move |url| Ok(responder_reply(&proofs, url)));

    transport
}

/// Transport whose responder signs for a different source on every attempt.
pub(crate) fn mismatched_transport(signer: &Signer) -> MockHandshakeTransport {
    let proofs = ProofTokenService::new(signer.clone());
    let mut transport = MockHandshakeTransport::new();

    transport.expect_get().times(2).returning(move |url| {
        let answer = proofs.respond(
            &url_domain(url),
            "someone-else.example.org",
            &query_value(url, "challenge"),
        );

        Ok(TransportResponse {
            status: 200,
            body: serde_json::json!({ "token": answer.token }).to_string(),
        })
    });

    transport
}
