//! Sitebind JSON API Server

use std::{process::ExitCode, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{OpenApi, swagger_ui::SwaggerUi},
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info, warn};

use sitebind_app::{context::AppContext, domain::registration::settings::RegistrationSettings};

use crate::{
    config::ServerConfig,
    healthcheck::RegistrationStatus,
    observability::{MetricsAuditSink, Observability, metrics_handler, request_logging},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config;
mod extensions;
mod healthcheck;
mod observability;
mod registration;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// Sitebind JSON API Server entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let mut config = match ServerConfig::load() {
        Ok(config) => config,
        Err(parse_error) => {
            #[expect(
                clippy::print_stderr,
                reason = "logging not initialized yet, must use eprintln for config errors"
            )]
            {
                eprintln!("Configuration error: {parse_error}");
            }

            return ExitCode::FAILURE;
        }
    };

    let observability = match Observability::init(&config) {
        Ok(observability) => observability,
        Err(init_error) => {
            #[expect(
                clippy::print_stderr,
                reason = "tracing subscriber failed to initialize"
            )]
            {
                eprintln!("Observability error: {init_error}");
            }

            return ExitCode::FAILURE;
        }
    };

    let code = serve(&mut config).await;

    observability.shutdown();

    code
}

async fn serve(config: &mut ServerConfig) -> ExitCode {
    let signer = match config.registration.take_signer() {
        Ok(signer) => signer,
        Err(signer_error) => {
            error!("invalid signing secret: {signer_error}");

            return ExitCode::FAILURE;
        }
    };

    let settings = config.registration.settings();

    let app = match AppContext::from_database_url(
        &config.database.database_url,
        config.database.migrate_on_start,
        settings,
        &signer,
        Arc::new(MetricsAuditSink::default()),
    )
    .await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error:?}");

            return ExitCode::FAILURE;
        }
    };

    check_default_role(&app, settings).await;

    let addr = config.socket_addr();

    info!(
        registration_enabled = settings.enabled,
        "Starting server on {addr}"
    );

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(request_logging)
        .hoop(remove_slash())
        .hoop(inject(State::from_app_context(&app)))
        .hoop(inject(RegistrationStatus {
            enabled: settings.enabled,
        }))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(router::app_router());

    let doc = OpenApi::new("Sitebind API", env!("CARGO_PKG_VERSION")).merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    // Listen for shutdown signal
    tokio::spawn(shutdown::listen(
        server.handle(),
        config.server.shutdown_grace(),
    ));

    // Start serving requests
    server.serve(router).await;

    ExitCode::SUCCESS
}

/// Warn at startup when registrations would fail on a missing default role.
async fn check_default_role(app: &AppContext, settings: RegistrationSettings) {
    if !settings.enabled {
        info!("site self-registration is disabled");

        return;
    }

    match app.roles.get_role(settings.default_role).await {
        Ok(role) => info!(role = %role.name, "self-registered admins get the default role"),
        Err(lookup_error) => warn!(
            role_uuid = %settings.default_role,
            "default role is unavailable, registrations will fail: {lookup_error}"
        ),
    }
}
