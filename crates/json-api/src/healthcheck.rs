//! Sitebind JSON API Healthcheck Handler

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Whether new sites may currently self-register
    pub registration_enabled: bool,
}

/// Healthcheck handler
///
/// Returns service health status
#[endpoint(tags("health"), summary = "Health check endpoint")]
pub(crate) async fn handler(depot: &mut Depot) -> Json<HealthResponse> {
    let registration_enabled = depot
        .obtain::<RegistrationStatus>()
        .is_ok_and(|status| status.enabled);

    Json(HealthResponse {
        status: "ok".to_string(),
        registration_enabled,
    })
}

/// Self-registration switch, injected at startup.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegistrationStatus {
    pub(crate) enabled: bool,
}
