//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        registration::{
            PgRegistrationService, RegistrationService, audit::AuditSink,
            settings::RegistrationSettings,
            transport::{HandshakeTransport, ReqwestTransport, TransportError},
        },
        roles::{PgRolesService, RolesService},
    },
    passwords::PasswordError,
    signing::Signer,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),

    #[error("failed to build handshake HTTP client")]
    Transport(#[source] TransportError),

    #[error("failed to configure password hashing")]
    Password(#[source] PasswordError),
}

#[derive(Clone)]
pub struct AppContext {
    pub registration: Arc<dyn RegistrationService>,
    pub roles: Arc<dyn RolesService>,
}

impl AppContext {
    /// Build application context from a database URL, optionally applying
    /// pending migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails, a
    /// migration fails, or the handshake client cannot be built.
    pub async fn from_database_url(
        url: &str,
        migrate: bool,
        settings: RegistrationSettings,
        signer: &Signer,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        if migrate {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;
        }

        let transport = ReqwestTransport::new(settings.handshake_timeout)
            .map_err(AppInitError::Transport)?;

        Self::from_db(Db::new(pool), settings, signer, Arc::new(transport), audit)
    }

    /// Build application context over an existing pool and transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the password hasher cannot be configured.
    pub fn from_db(
        db: Db,
        settings: RegistrationSettings,
        signer: &Signer,
        transport: Arc<dyn HandshakeTransport>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, AppInitError> {
        let registration =
            PgRegistrationService::new(db.clone(), settings, signer, transport, audit)
                .map_err(AppInitError::Password)?;

        Ok(Self {
            registration: Arc::new(registration),
            roles: Arc::new(PgRolesService::new(db)),
        })
    }
}
