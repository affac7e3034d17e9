//! Registration settings.

use std::time::Duration;

use crate::domain::{
    registration::{claim::DEFAULT_CLAIM_TOKEN_TTL, transport::DEFAULT_HANDSHAKE_TIMEOUT},
    roles::records::RoleUuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSettings {
    /// Self-registration is off unless explicitly enabled.
    pub enabled: bool,

    /// Role attached to every self-registered admin.
    pub default_role: RoleUuid,

    pub claim_token_ttl: Duration,
    pub validate_hostnames: bool,

    /// Per-attempt timeout; a full handshake may take twice this.
    pub handshake_timeout: Duration,
}

impl RegistrationSettings {
    /// Enabled settings with defaults for everything but the role.
    #[must_use]
    pub fn enabled(default_role: RoleUuid) -> Self {
        Self {
            enabled: true,
            default_role,
            claim_token_ttl: DEFAULT_CLAIM_TOKEN_TTL,
            validate_hostnames: true,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}
