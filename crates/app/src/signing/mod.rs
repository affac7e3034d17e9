//! HMAC-SHA256 signing over canonical strings.
//!
//! Every token this service issues or checks (handshake proofs and domain
//! claims) is a hex-encoded HMAC-SHA256 of a `|`-delimited payload, produced by
//! one [`Signer`] built from the configured [`SigningSecret`].

mod secret;

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub use secret::{MIN_SIGNING_SECRET_BYTES, SigningSecret, generate_secret_hex};

type HmacSha256 = Hmac<Sha256>;

/// Name of the signing algorithm, as reported to handshake peers.
pub const SIGNING_ALGORITHM: &str = "HMAC-SHA256";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("signing secret must be at least {MIN_SIGNING_SECRET_BYTES} bytes, got {0}")]
    SecretTooShort(usize),

    #[error("signing secret could not be used as an HMAC key")]
    InvalidKey,
}

/// Keyed HMAC-SHA256 signer.
///
/// The raw secret is not retained; only the keyed MAC state is kept and cloned
/// for each signature.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha256,
}

impl Signer {
    /// Build a signer from a validated secret.
    pub fn new(secret: &SigningSecret) -> Result<Self, SignerError> {
        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_invalid_length| SignerError::InvalidKey)?;

        Ok(Self { mac })
    }

    /// Hex-encoded HMAC-SHA256 of `message`.
    #[must_use]
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac.clone();

        mac.update(message.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against the signature of `message` in constant time.
    #[must_use]
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        constant_time_eq(self.sign(message).as_bytes(), signature.as_bytes())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Signer(**redacted**)")
    }
}

/// Compare two byte strings without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.ct_eq(right).into()
}
