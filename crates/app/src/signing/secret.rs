//! Signing secret handling.

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroize;

use crate::signing::SignerError;

/// Minimum accepted signing secret length in bytes.
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

/// Shared HMAC secret. Zeroed on drop and never printed.
pub struct SigningSecret {
    bytes: Vec<u8>,
}

impl SigningSecret {
    /// Validate and wrap a configured secret.
    ///
    /// There is no fallback value: an empty or short secret is a configuration
    /// error the caller must surface at startup.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SignerError> {
        let bytes = secret.into();

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SignerError::MissingSecret);
        }

        if bytes.len() < MIN_SIGNING_SECRET_BYTES {
            return Err(SignerError::SecretTooShort(bytes.len()));
        }

        Ok(Self { bytes })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(**redacted**)")
    }
}

impl Drop for SigningSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Generate a fresh random secret, hex-encoded, suitable for `SIGNING_SECRET`.
#[must_use]
pub fn generate_secret_hex() -> String {
    let mut bytes = [0_u8; MIN_SIGNING_SECRET_BYTES];

    OsRng.fill_bytes(&mut bytes);

    let encoded = hex::encode(bytes);

    bytes.zeroize();

    encoded
}
