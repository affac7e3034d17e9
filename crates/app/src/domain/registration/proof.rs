//! Handshake proof tokens.

use rand::{RngCore, rngs::OsRng};
use serde::Serialize;

use crate::signing::{SIGNING_ALGORITHM, Signer};

/// Number of random bytes in a handshake challenge.
pub const CHALLENGE_BYTES: usize = 16;

/// Fresh hex-encoded challenge from the OS CSPRNG.
#[must_use]
pub fn generate_challenge() -> String {
    let mut bytes = [0_u8; CHALLENGE_BYTES];

    OsRng.fill_bytes(&mut bytes);

    hex::encode(bytes)
}

/// What a verification responder returns for a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofResponse {
    pub token: String,
    pub domain: String,
    pub source: String,
    pub challenge: String,
    pub payload: String,
    pub algorithm: &'static str,
}

/// Signs and checks `domain|source|challenge` proofs.
#[derive(Debug, Clone)]
pub struct ProofTokenService {
    signer: Signer,
}

impl ProofTokenService {
    #[must_use]
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Canonical payload. Domain and source are lowercased, the challenge is
    /// used as given.
    #[must_use]
    pub fn payload(domain: &str, source: &str, challenge: &str) -> String {
        format!(
            "{}|{}|{challenge}",
            domain.to_ascii_lowercase(),
            source.to_ascii_lowercase()
        )
    }

    #[must_use]
    pub fn token(&self, domain: &str, source: &str, challenge: &str) -> String {
        self.signer.sign(&Self::payload(domain, source, challenge))
    }

    /// Constant-time check of a proof received from a peer.
    #[must_use]
    pub fn verify(&self, domain: &str, source: &str, challenge: &str, token: &str) -> bool {
        self.signer
            .verify(&Self::payload(domain, source, challenge), token)
    }

    /// Full responder answer for a challenge received on `domain`.
    #[must_use]
    pub fn respond(&self, domain: &str, source: &str, challenge: &str) -> ProofResponse {
        let payload = Self::payload(domain, source, challenge);

        ProofResponse {
            token: self.signer.sign(&payload),
            domain: domain.to_ascii_lowercase(),
            source: source.to_ascii_lowercase(),
            challenge: challenge.to_string(),
            payload,
            algorithm: SIGNING_ALGORITHM,
        }
    }
}
