//! Site self-registration service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rand::{rngs::OsRng, seq::SliceRandom};
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        admins::{data::NewAdminUser, records::AdminUserUuid, repository::PgAdminUsersRepository},
        registration::{
            audit::{AuditEvent, AuditSink},
            candidate::CandidateDomain,
            claim::ClaimTokenService,
            data::{DomainVerificationRequest, RegistrationRequest, RequestContext},
            errors::RegistrationError,
            handshake::HandshakeClient,
            proof::{ProofResponse, ProofTokenService},
            records::{ProvisionedSite, VerifiedDomain},
            rules::{RegistrationRules, non_blank},
            settings::RegistrationSettings,
            stage::RegistrationProgress,
            transport::HandshakeTransport,
        },
        roles::repository::PgRolesRepository,
        sites::{
            data::NewSite,
            records::{SiteUuid, login_url},
            repository::PgSitesRepository,
        },
    },
    passwords::{PasswordError, PasswordHasher},
    signing::Signer,
};

/// Length of the generated admin entry path.
pub const ADMIN_ENTRY_PATH_LENGTH: usize = 12;

const ADMIN_ENTRY_PATH_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Clone)]
pub struct PgRegistrationService {
    db: Db,
    settings: RegistrationSettings,
    rules: RegistrationRules,
    sites: PgSitesRepository,
    admins: PgAdminUsersRepository,
    roles: PgRolesRepository,
    handshake: HandshakeClient,
    proofs: ProofTokenService,
    claims: ClaimTokenService,
    passwords: PasswordHasher,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for PgRegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRegistrationService")
            .field("settings", &self.settings)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl PgRegistrationService {
    pub fn new(
        db: Db,
        settings: RegistrationSettings,
        signer: &Signer,
        transport: Arc<dyn HandshakeTransport>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, PasswordError> {
        let proofs = ProofTokenService::new(signer.clone());

        Ok(Self {
            db,
            settings,
            rules: RegistrationRules::new(settings.validate_hostnames),
            sites: PgSitesRepository::new(),
            admins: PgAdminUsersRepository::new(),
            roles: PgRolesRepository::new(),
            handshake: HandshakeClient::new(transport, proofs.clone(), audit.clone()),
            proofs,
            claims: ClaimTokenService::new(signer.clone(), settings.claim_token_ttl),
            passwords: PasswordHasher::new()?,
            audit,
        })
    }

    /// Replace the password hasher.
    #[must_use]
    pub fn with_password_hasher(mut self, passwords: PasswordHasher) -> Self {
        self.passwords = passwords;
        self
    }

    fn ensure_enabled(&self) -> Result<(), RegistrationError> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(RegistrationError::Disabled)
        }
    }

    async fn ensure_available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        domain: &CandidateDomain,
    ) -> Result<(), RegistrationError> {
        if self.sites.domain_exists(tx, domain.as_str()).await? {
            return Err(RegistrationError::DomainTaken);
        }

        Ok(())
    }

    async fn check_available(&self, domain: &CandidateDomain) -> Result<(), RegistrationError> {
        let mut tx = self.db.begin().await?;

        self.ensure_available(&mut tx, domain).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn hash_password(&self, password: &str) -> Result<String, RegistrationError> {
        let passwords = self.passwords.clone();
        let password = password.to_string();

        let hashed = tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|error| PasswordError::Hash(error.to_string()))??;

        Ok(hashed)
    }

    async fn run_registration(
        &self,
        progress: &mut RegistrationProgress<'_>,
        request: RegistrationRequest,
    ) -> Result<ProvisionedSite, RegistrationError> {
        self.ensure_enabled()?;

        let domain = self.rules.check_domain(&request.site_domain)?;

        progress.advance(domain.as_str());

        if let Err(error) = self.claims.verify(&request.domain_token, &domain) {
            self.audit.record(AuditEvent::ClaimTokenRejected {
                domain: domain.to_string(),
                reason: error.reason(),
            });

            return Err(error.into());
        }

        progress.advance(domain.as_str());

        self.rules.check_fields(&domain, &request)?;
        self.check_available(&domain).await?;

        progress.advance(domain.as_str());

        let password_hash = self.hash_password(&request.password).await?;
        let provisioned = self.provision(&domain, request, password_hash).await?;

        progress.advance(domain.as_str());

        Ok(provisioned)
    }

    /// Create the site, its admin and the role link in one transaction.
    #[tracing::instrument(
        name = "registration.service.provision",
        skip(self, request, password_hash),
        fields(domain = %domain, site_uuid = tracing::field::Empty),
        err
    )]
    async fn provision(
        &self,
        domain: &CandidateDomain,
        request: RegistrationRequest,
        password_hash: String,
    ) -> Result<ProvisionedSite, RegistrationError> {
        let mut tx = self.db.begin().await?;

        self.ensure_available(&mut tx, domain).await?;

        let site_uuid = SiteUuid::new();
        let admin_uuid = AdminUserUuid::new();

        tracing::Span::current().record("site_uuid", tracing::field::display(site_uuid));

        let name = non_blank(request.site_name.as_deref())
            .map_or_else(|| domain.to_string(), str::to_string);

        let site = self
            .sites
            .create_site(
                &mut tx,
                NewSite {
                    uuid: site_uuid,
                    domain: domain.to_string(),
                    name,
                    admin_entry_path: generate_admin_entry_path(),
                    owner_admin_uuid: admin_uuid,
                },
            )
            .await?;

        let admin = self
            .admins
            .create_admin_user(
                &mut tx,
                NewAdminUser {
                    uuid: admin_uuid,
                    site_uuid: site.uuid,
                    username: request.username,
                    password_hash,
                    real_name: request.real_name.trim().to_string(),
                    mobile: request.mobile,
                    email: non_blank(request.email.as_deref()).map(str::to_string),
                },
            )
            .await?;

        let role = self
            .roles
            .find_role(&mut tx, self.settings.default_role)
            .await?
            .ok_or(RegistrationError::DefaultRoleMissing)?;

        self.admins
            .attach_role(&mut tx, admin.uuid, role.uuid)
            .await?;

        tx.commit().await?;

        self.audit.record(AuditEvent::RegistrationCommitted {
            domain: site.domain.clone(),
            site_uuid: site.uuid.to_string(),
            admin_uuid: admin.uuid.to_string(),
            role_name: role.name.clone(),
        });

        info!(site_uuid = %site.uuid, domain = %site.domain, "provisioned site");

        Ok(ProvisionedSite {
            site_uuid: site.uuid,
            login_url: login_url(&site.admin_entry_path),
            domain: site.domain,
            name: site.name,
            admin_entry_path: site.admin_entry_path,
            username: admin.username,
            password: request.password,
            role_name: role.name,
        })
    }
}

#[async_trait]
impl RegistrationService for PgRegistrationService {
    #[tracing::instrument(
        name = "registration.service.verify_domain",
        skip(self, context, request),
        fields(host = %context.host),
        err
    )]
    async fn verify_domain(
        &self,
        context: RequestContext,
        request: DomainVerificationRequest,
    ) -> Result<VerifiedDomain, RegistrationError> {
        self.audit.record(AuditEvent::VerificationRequested {
            domain: request.site_domain.clone(),
            host: context.host.clone(),
            remote_addr: context.remote_addr.clone(),
        });

        self.ensure_enabled()?;

        let domain = self.rules.check_domain(&request.site_domain)?;

        self.check_available(&domain).await?;

        self.handshake.verify(&domain, &context.source()).await?;

        let issued = self.claims.issue(&domain);

        self.audit.record(AuditEvent::ClaimTokenIssued {
            domain: issued.domain.clone(),
            expires_at: issued.expires_at,
        });

        Ok(VerifiedDomain {
            token: issued.token,
            domain: issued.domain,
            expires_in: issued.expires_in,
        })
    }

    #[tracing::instrument(
        name = "registration.service.register",
        skip(self, context, request),
        fields(host = %context.host),
        err
    )]
    async fn register(
        &self,
        context: RequestContext,
        request: RegistrationRequest,
    ) -> Result<ProvisionedSite, RegistrationError> {
        self.audit.record(AuditEvent::RegistrationRequested {
            domain: request.site_domain.clone(),
            host: context.host,
            remote_addr: context.remote_addr,
        });

        let mut progress = RegistrationProgress::start(&*self.audit, &request.site_domain);

        let result = self.run_registration(&mut progress, request).await;

        if let Err(error) = &result {
            progress.fail(error.to_string());
        }

        result
    }

    fn respond_to_challenge(&self, domain: &str, source: &str, challenge: &str) -> ProofResponse {
        let response = self.proofs.respond(domain, source, challenge);

        self.audit.record(AuditEvent::ChallengeAnswered {
            domain: response.domain.clone(),
            source: response.source.clone(),
            challenge: response.challenge.clone(),
        });

        response
    }
}

#[automock]
#[async_trait]
/// Self-service site registration.
pub trait RegistrationService: Send + Sync {
    /// Prove control of a domain and issue a claim token for it.
    async fn verify_domain(
        &self,
        context: RequestContext,
        request: DomainVerificationRequest,
    ) -> Result<VerifiedDomain, RegistrationError>;

    /// Provision a site, its admin user and role link for a claimed domain.
    async fn register(
        &self,
        context: RequestContext,
        request: RegistrationRequest,
    ) -> Result<ProvisionedSite, RegistrationError>;

    /// Answer a verification challenge received on `domain`.
    fn respond_to_challenge(&self, domain: &str, source: &str, challenge: &str) -> ProofResponse;
}

fn generate_admin_entry_path() -> String {
    (0..ADMIN_ENTRY_PATH_LENGTH)
        .filter_map(|_| ADMIN_ENTRY_PATH_CHARSET.choose(&mut OsRng))
        .map(|&byte| char::from(byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::{SignedDuration, Timestamp};
    use sqlx::query_scalar;
    use testresult::TestResult;

    use crate::{
        domain::{
            registration::{
                claim::{ClaimTokenError, DEFAULT_CLAIM_TOKEN_TTL},
                handshake::HandshakeError,
                rules::SITE_DOMAIN_FIELD,
                stage::RegistrationStage,
                transport::MockHandshakeTransport,
            },
            roles::records::RoleUuid,
            sites::SitesService,
        },
        test::{
            TestContext,
            helpers::{answering_transport, mismatched_transport},
        },
    };

    use super::*;

    const PLATFORM_HOST: &str = "Platform.Example.NET";
    const DOMAIN: &str = "shop.example.com";

    fn context() -> RequestContext {
        RequestContext::new(PLATFORM_HOST, Some("203.0.113.7".to_string()))
    }

    fn registration(token: &str) -> RegistrationRequest {
        RegistrationRequest {
            site_domain: DOMAIN.to_string(),
            domain_token: token.to_string(),
            username: "owner".to_string(),
            password: "s3cret-pass".to_string(),
            real_name: "Site Owner".to_string(),
            mobile: "+4412345678".to_string(),
            email: Some("owner@example.com".to_string()),
            site_name: None,
        }
    }

    fn claim_token(ctx: &TestContext, issued_at: Timestamp) -> String {
        ClaimTokenService::new(ctx.signer.clone(), DEFAULT_CLAIM_TOKEN_TTL)
            .issue_at(&CandidateDomain::normalize(DOMAIN), issued_at)
            .token
    }

    async fn count(ctx: &TestContext, table: &str) -> Result<i64, sqlx::Error> {
        query_scalar::<_, i64>(&format!("SELECT count(*) FROM {table}"))
            .fetch_one(ctx.db.pool())
            .await
    }

    async fn assert_no_rows(ctx: &TestContext) -> TestResult {
        assert_eq!(count(ctx, "sites").await?, 0, "no site rows");
        assert_eq!(count(ctx, "admin_users").await?, 0, "no admin rows");
        assert_eq!(count(ctx, "admin_user_roles").await?, 0, "no role links");

        Ok(())
    }

    #[tokio::test]
    async fn verified_domain_can_be_registered() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(answering_transport(&ctx.signer))?;

        let verified = service
            .verify_domain(
                context(),
                DomainVerificationRequest {
                    site_domain: "https://Shop.Example.com/".to_string(),
                },
            )
            .await?;

        assert_eq!(verified.domain, DOMAIN);
        assert_eq!(verified.expires_in, 300);

        let site = service.register(context(), registration(&verified.token)).await?;

        assert_eq!(site.domain, DOMAIN);
        assert_eq!(site.name, DOMAIN);
        assert_eq!(site.username, "owner");
        assert_eq!(site.password, "s3cret-pass");
        assert_eq!(site.role_name, ctx.default_role.name);
        assert_eq!(site.admin_entry_path.len(), ADMIN_ENTRY_PATH_LENGTH);
        assert_eq!(site.login_url, format!("/admin/{}/login", site.admin_entry_path));

        let stored = ctx.sites.get_site_by_domain(DOMAIN).await?;
        let admins = ctx.admins_of(stored.uuid).await?;
        let admin = admins.first().ok_or("admin user should exist")?;

        assert_eq!(stored.uuid, site.site_uuid);
        assert_eq!(stored.owner_admin_uuid, admin.uuid);
        assert_eq!(admins.len(), 1);
        assert!(!admin.is_super, "self-registered admins are never super users");
        assert_ne!(admin.password_hash, "s3cret-pass");
        assert_eq!(
            ctx.role_names_of(admin.uuid).await?,
            vec![ctx.default_role.name.clone()]
        );

        assert!(ctx.audit.events().contains(&AuditEvent::RegistrationRequested {
            domain: DOMAIN.to_string(),
            host: PLATFORM_HOST.to_string(),
            remote_addr: Some("203.0.113.7".to_string()),
        }));

        let stages: Vec<_> = ctx
            .audit
            .events()
            .into_iter()
            .filter_map(|event| match event {
                AuditEvent::StageEntered { stage, .. } => Some(stage),
                _ => None,
            })
            .collect();

        assert_eq!(
            stages,
            [
                RegistrationStage::ReceivedPayload,
                RegistrationStage::DomainNormalized,
                RegistrationStage::TokenValidated,
                RegistrationStage::FieldsValidated,
                RegistrationStage::Committed,
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn site_name_is_used_when_given() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;

        let site = service
            .register(
                context(),
                RegistrationRequest {
                    site_name: Some("Corner Shop".to_string()),
                    ..registration(&claim_token(&ctx, Timestamp::now()))
                },
            )
            .await?;

        assert_eq!(site.name, "Corner Shop");

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_registrations_have_one_winner() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;
        let token = claim_token(&ctx, Timestamp::now());

        let (first, second) = tokio::join!(
            service.register(context(), registration(&token)),
            service.register(
                context(),
                RegistrationRequest {
                    username: "rival".to_string(),
                    ..registration(&token)
                }
            ),
        );

        let outcomes = [first, second];
        let winners = outcomes.iter().filter(|result| result.is_ok()).count();

        assert_eq!(winners, 1, "exactly one registration must succeed");
        assert!(
            outcomes
                .iter()
                .any(|result| matches!(result, Err(RegistrationError::DomainTaken))),
            "loser must see a domain conflict, got {outcomes:?}"
        );
        assert_eq!(count(&ctx, "sites").await?, 1);
        assert_eq!(count(&ctx, "admin_users").await?, 1);
        assert_eq!(count(&ctx, "admin_user_roles").await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn expired_claim_token_is_rejected_without_writing() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;
        let issued_at = Timestamp::now().checked_sub(SignedDuration::from_secs(301))?;

        let result = service
            .register(context(), registration(&claim_token(&ctx, issued_at)))
            .await;

        assert!(
            matches!(
                result,
                Err(RegistrationError::ClaimToken(ClaimTokenError::Expired))
            ),
            "expected expired token, got {result:?}"
        );
        assert!(ctx.audit.events().contains(&AuditEvent::ClaimTokenRejected {
            domain: DOMAIN.to_string(),
            reason: "expired",
        }));
        assert!(ctx.audit.events().contains(&AuditEvent::RegistrationFailed {
            domain: DOMAIN.to_string(),
            stage: RegistrationStage::DomainNormalized,
            reason: RegistrationError::ClaimToken(ClaimTokenError::Expired).to_string(),
        }));

        assert_no_rows(&ctx).await
    }

    #[tokio::test]
    async fn claim_token_for_another_domain_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;

        let result = service
            .register(
                context(),
                RegistrationRequest {
                    site_domain: "other.example.com".to_string(),
                    ..registration(&claim_token(&ctx, Timestamp::now()))
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(RegistrationError::ClaimToken(ClaimTokenError::DomainMismatch))
        ));

        assert_no_rows(&ctx).await
    }

    #[tokio::test]
    async fn mismatched_proof_fails_verification() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(mismatched_transport(&ctx.signer))?;

        let result = service
            .verify_domain(
                context(),
                DomainVerificationRequest {
                    site_domain: DOMAIN.to_string(),
                },
            )
            .await;

        let Err(RegistrationError::Handshake(HandshakeError { report })) = result else {
            return Err(format!("expected handshake failure, got {result:?}").into());
        };

        assert_eq!(report.attempts.len(), 2);
        assert!(
            report
                .attempts
                .iter()
                .all(|attempt| attempt.message == "Token mismatch")
        );
        assert!(
            !ctx.audit
                .events()
                .iter()
                .any(|event| matches!(event, AuditEvent::ClaimTokenIssued { .. })),
            "no claim token may be issued"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_domain_is_rejected_before_handshake() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;

        let result = service
            .verify_domain(
                context(),
                DomainVerificationRequest {
                    site_domain: "not a domain".to_string(),
                },
            )
            .await;

        let Err(RegistrationError::Validation(errors)) = result else {
            return Err(format!("expected validation failure, got {result:?}").into());
        };

        assert!(errors.get(SITE_DOMAIN_FIELD).is_some());

        Ok(())
    }

    #[tokio::test]
    async fn registered_domain_cannot_be_verified_again() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.insert_site(DOMAIN).await?;

        let service = ctx.registration(MockHandshakeTransport::new())?;

        let result = service
            .verify_domain(
                context(),
                DomainVerificationRequest {
                    site_domain: "SHOP.example.com".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(RegistrationError::DomainTaken)));

        Ok(())
    }

    #[tokio::test]
    async fn disabled_registration_rejects_everything() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration_with(MockHandshakeTransport::new(), |settings| {
            settings.enabled = false;
        })?;

        let verify = service
            .verify_domain(
                context(),
                DomainVerificationRequest {
                    site_domain: DOMAIN.to_string(),
                },
            )
            .await;

        let register = service
            .register(context(), registration(&claim_token(&ctx, Timestamp::now())))
            .await;

        assert!(matches!(verify, Err(RegistrationError::Disabled)));
        assert!(matches!(register, Err(RegistrationError::Disabled)));

        assert_no_rows(&ctx).await
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_together() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;

        let result = service
            .register(
                context(),
                RegistrationRequest {
                    username: "9lives".to_string(),
                    password: "short".to_string(),
                    mobile: "call me".to_string(),
                    ..registration(&claim_token(&ctx, Timestamp::now()))
                },
            )
            .await;

        let Err(RegistrationError::Validation(errors)) = result else {
            return Err(format!("expected validation failure, got {result:?}").into());
        };

        assert_eq!(errors.len(), 3);
        assert!(errors.get("username").is_some());
        assert!(errors.get("password").is_some());
        assert!(errors.get("mobile").is_some());

        assert_no_rows(&ctx).await
    }

    #[tokio::test]
    async fn missing_default_role_rolls_back() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration_with(MockHandshakeTransport::new(), |settings| {
            settings.default_role = RoleUuid::new();
        })?;

        let result = service
            .register(context(), registration(&claim_token(&ctx, Timestamp::now())))
            .await;

        assert!(matches!(result, Err(RegistrationError::DefaultRoleMissing)));

        assert_no_rows(&ctx).await
    }

    #[tokio::test]
    async fn respond_to_challenge_signs_and_audits() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.registration(MockHandshakeTransport::new())?;

        let response = service.respond_to_challenge("Shop.Example.com", "Platform.io", "abc");

        assert_eq!(
            response.token,
            ctx.signer.sign("shop.example.com|platform.io|abc")
        );
        assert!(ctx.audit.events().contains(&AuditEvent::ChallengeAnswered {
            domain: DOMAIN.to_string(),
            source: "platform.io".to_string(),
            challenge: "abc".to_string(),
        }));

        Ok(())
    }

    #[test]
    fn admin_entry_paths_are_lowercase_alphanumeric() {
        let path = generate_admin_entry_path();

        assert_eq!(path.len(), ADMIN_ENTRY_PATH_LENGTH);
        assert!(
            path.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
        assert_ne!(path, generate_admin_entry_path());
    }

    #[test]
    fn settings_claim_ttl_defaults_to_five_minutes() {
        assert_eq!(
            RegistrationSettings::enabled(RoleUuid::new()).claim_token_ttl,
            Duration::from_secs(300)
        );
    }
}
