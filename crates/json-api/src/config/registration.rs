//! Registration Config

use std::{mem, time::Duration};

use clap::{ArgAction, Args};
use uuid::Uuid;

use sitebind_app::{
    domain::registration::settings::RegistrationSettings,
    signing::{Signer, SignerError, SigningSecret},
};

/// Site self-registration settings.
#[derive(Args)]
pub struct RegistrationConfig {
    /// Allow visitors to register new sites
    #[arg(long, env = "REGISTRATION_ENABLED", default_value_t = false, action = ArgAction::Set)]
    pub registration_enabled: bool,

    /// Role attached to the first admin of every registered site
    #[arg(long, env = "REGISTRATION_DEFAULT_ROLE_UUID")]
    pub registration_default_role_uuid: Uuid,

    /// Claim token lifetime in seconds
    #[arg(long, env = "CLAIM_TOKEN_TTL_SECONDS", default_value_t = 300)]
    pub claim_token_ttl_seconds: u64,

    /// Enforce RFC 1123 hostname syntax on candidate domains
    #[arg(long, env = "VALIDATE_HOSTNAMES", default_value_t = true, action = ArgAction::Set)]
    pub validate_hostnames: bool,

    /// HMAC key for handshake proofs and claim tokens (at least 32 bytes)
    #[arg(long, env = "SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: String,

    /// Per-request timeout for handshake calls, in seconds
    #[arg(long, env = "HANDSHAKE_TIMEOUT_SECONDS", default_value_t = 5)]
    pub handshake_timeout_seconds: u64,
}

impl std::fmt::Debug for RegistrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationConfig")
            .field("registration_enabled", &self.registration_enabled)
            .field(
                "registration_default_role_uuid",
                &self.registration_default_role_uuid,
            )
            .field("claim_token_ttl_seconds", &self.claim_token_ttl_seconds)
            .field("validate_hostnames", &self.validate_hostnames)
            .field("handshake_timeout_seconds", &self.handshake_timeout_seconds)
            .finish_non_exhaustive()
    }
}

impl RegistrationConfig {
    #[must_use]
    pub fn settings(&self) -> RegistrationSettings {
        RegistrationSettings {
            enabled: self.registration_enabled,
            default_role: self.registration_default_role_uuid.into(),
            claim_token_ttl: Duration::from_secs(self.claim_token_ttl_seconds),
            validate_hostnames: self.validate_hostnames,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_seconds),
        }
    }

    /// Build the signer, moving the secret out of the config so only the
    /// zeroizing copy remains.
    ///
    /// # Errors
    ///
    /// Returns an error when the secret is blank or too short.
    pub fn take_signer(&mut self) -> Result<Signer, SignerError> {
        let secret = SigningSecret::new(mem::take(&mut self.signing_secret))?;

        Signer::new(&secret)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        registration: RegistrationConfig,
    }

    const ROLE: &str = "0190f0a4-3b8e-7c4e-9a51-2f0c1d8e4b7a";
    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn parse(extra: &[&str]) -> Result<Harness, clap::Error> {
        let mut args = vec![
            "sitebind-json",
            "--registration-default-role-uuid",
            ROLE,
            "--signing-secret",
            SECRET,
        ];
        args.extend_from_slice(extra);

        Harness::try_parse_from(args)
    }

    #[test]
    fn defaults_match_documented_values() -> TestResult {
        let settings = parse(&[])?.registration.settings();

        assert!(!settings.enabled);
        assert!(settings.validate_hostnames);
        assert_eq!(settings.claim_token_ttl, Duration::from_secs(300));
        assert_eq!(settings.handshake_timeout, Duration::from_secs(5));
        assert_eq!(settings.default_role.into_uuid(), Uuid::parse_str(ROLE)?);

        Ok(())
    }

    #[test]
    fn switches_take_explicit_values() -> TestResult {
        let settings = parse(&[
            "--registration-enabled",
            "true",
            "--validate-hostnames",
            "false",
            "--claim-token-ttl-seconds",
            "60",
        ])?
        .registration
        .settings();

        assert!(settings.enabled);
        assert!(!settings.validate_hostnames);
        assert_eq!(settings.claim_token_ttl, Duration::from_secs(60));

        Ok(())
    }

    #[test]
    fn signer_takes_secret_out_of_config() -> TestResult {
        let mut config = parse(&[])?.registration;

        let signer = config.take_signer()?;

        assert!(config.signing_secret.is_empty());
        assert_eq!(signer.sign("payload").len(), 64);

        Ok(())
    }

    #[test]
    fn short_secret_is_rejected() -> TestResult {
        let mut config = parse(&[])?.registration;
        config.signing_secret = "short".to_string();

        assert!(matches!(
            config.take_signer(),
            Err(SignerError::SecretTooShort(5))
        ));

        Ok(())
    }

    #[test]
    fn debug_output_hides_secret() -> TestResult {
        let config = parse(&[])?.registration;

        assert!(!format!("{config:?}").contains(SECRET));

        Ok(())
    }
}
