//! Time-boxed domain claim tokens.
//!
//! A claim token is `base64(domain|expiresAt|signature)` where `signature` is
//! the hex HMAC of `domain|expiresAt`. Tokens are self-contained: nothing is
//! stored server-side, so a token stays usable until it expires.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use jiff::Timestamp;
use thiserror::Error;

use crate::{domain::registration::candidate::CandidateDomain, signing::Signer};

/// Default claim token lifetime.
pub const DEFAULT_CLAIM_TOKEN_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ClaimTokenError {
    #[error("claim token could not be decoded")]
    Decode,

    #[error("claim token has an unexpected number of fields")]
    FieldCount,

    #[error("claim token has expired")]
    Expired,

    #[error("claim token was issued for a different domain")]
    DomainMismatch,

    #[error("claim token signature does not match")]
    SignatureMismatch,
}

impl ClaimTokenError {
    /// Stable identifier for logs and metrics.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::FieldCount => "field_count",
            Self::Expired => "expired",
            Self::DomainMismatch => "domain_mismatch",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedClaimToken {
    pub token: String,
    pub domain: String,

    /// Lifetime in seconds.
    pub expires_in: u64,

    /// Unix seconds after which the token is rejected.
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct ClaimTokenService {
    signer: Signer,
    ttl: Duration,
}

impl ClaimTokenService {
    #[must_use]
    pub fn new(signer: Signer, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn issue(&self, domain: &CandidateDomain) -> IssuedClaimToken {
        self.issue_at(domain, Timestamp::now())
    }

    #[must_use]
    pub fn issue_at(&self, domain: &CandidateDomain, now: Timestamp) -> IssuedClaimToken {
        let ttl = self.ttl.as_secs();
        let expires_at = now
            .as_second()
            .saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX));

        let payload = format!("{domain}|{expires_at}");
        let signature = self.signer.sign(&payload);

        IssuedClaimToken {
            token: STANDARD.encode(format!("{payload}|{signature}")),
            domain: domain.to_string(),
            expires_in: ttl,
            expires_at,
        }
    }

    pub fn verify(&self, token: &str, domain: &CandidateDomain) -> Result<(), ClaimTokenError> {
        self.verify_at(token, domain, Timestamp::now())
    }

    /// Check a submitted token against the domain being registered.
    ///
    /// A token whose expiry equals `now` is still valid.
    pub fn verify_at(
        &self,
        token: &str,
        domain: &CandidateDomain,
        now: Timestamp,
    ) -> Result<(), ClaimTokenError> {
        let decoded = STANDARD
            .decode(token.trim())
            .map_err(|_invalid_base64| ClaimTokenError::Decode)?;
        let decoded = String::from_utf8(decoded).map_err(|_invalid_utf8| ClaimTokenError::Decode)?;

        let fields: Vec<&str> = decoded.split('|').collect();

        let [token_domain, expires_at, signature] = fields.as_slice() else {
            return Err(ClaimTokenError::FieldCount);
        };

        let expires_at: i64 = expires_at
            .parse()
            .map_err(|_not_a_number| ClaimTokenError::Decode)?;

        if expires_at < now.as_second() {
            return Err(ClaimTokenError::Expired);
        }

        if !domain.matches(token_domain) {
            return Err(ClaimTokenError::DomainMismatch);
        }

        if !self
            .signer
            .verify(&format!("{token_domain}|{expires_at}"), signature)
        {
            return Err(ClaimTokenError::SignatureMismatch);
        }

        Ok(())
    }
}
