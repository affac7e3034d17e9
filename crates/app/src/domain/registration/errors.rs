//! Registration errors.

use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::{
    domain::{
        registration::{claim::ClaimTokenError, handshake::HandshakeError, rules::ValidationErrors},
        sites::repository::SITES_DOMAIN_CONSTRAINT,
    },
    passwords::PasswordError,
};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("site self-registration is disabled")]
    Disabled,

    #[error("invalid registration data")]
    Validation(ValidationErrors),

    #[error("a site is already registered for this domain")]
    DomainTaken,

    #[error("domain could not be verified")]
    Handshake(#[from] HandshakeError),

    #[error("domain token is invalid or has expired, please verify the domain again")]
    ClaimToken(#[from] ClaimTokenError),

    #[error("the default role for new sites does not exist")]
    DefaultRoleMissing,

    #[error("failed to hash password")]
    Password(#[from] PasswordError),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl RegistrationError {
    /// Whether this is a server-side provisioning failure rather than a
    /// problem with the request.
    #[must_use]
    pub fn is_provisioning_failure(&self) -> bool {
        matches!(
            self,
            Self::DefaultRoleMissing | Self::Password(_) | Self::Sql(_)
        )
    }

    /// Stable identifier for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Validation(_) => "validation",
            Self::DomainTaken => "domain_taken",
            Self::Handshake(_) => "handshake",
            Self::ClaimToken(_) => "claim_token",
            Self::DefaultRoleMissing => "default_role_missing",
            Self::Password(_) => "password",
            Self::Sql(_) => "sql",
        }
    }
}

impl From<ValidationErrors> for RegistrationError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<sqlx::Error> for RegistrationError {
    fn from(error: sqlx::Error) -> Self {
        let domain_conflict = error.as_database_error().is_some_and(|database| {
            matches!(database.kind(), ErrorKind::UniqueViolation)
                && database.constraint() == Some(SITES_DOMAIN_CONSTRAINT)
        });

        if domain_conflict {
            Self::DomainTaken
        } else {
            Self::Sql(error)
        }
    }
}
