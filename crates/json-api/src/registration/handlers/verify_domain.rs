//! Verify Domain Handler

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use sitebind_app::domain::registration::{
    data::DomainVerificationRequest, records::VerifiedDomain,
};

use crate::{
    extensions::*,
    registration::errors::{reject_unreadable_body, render_error},
};

/// Verify Domain Request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct VerifyDomainRequest {
    /// Domain to claim, with or without a scheme prefix
    pub site_domain: String,
}

impl From<VerifyDomainRequest> for DomainVerificationRequest {
    fn from(request: VerifyDomainRequest) -> Self {
        DomainVerificationRequest {
            site_domain: request.site_domain,
        }
    }
}

/// Verify Domain Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifyDomainResponse {
    /// Claim token to send with the registration request
    pub token: String,
    /// Normalized domain the token is bound to
    pub domain: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

impl From<VerifiedDomain> for VerifyDomainResponse {
    fn from(verified: VerifiedDomain) -> Self {
        VerifyDomainResponse {
            token: verified.token,
            domain: verified.domain,
            expires_in: verified.expires_in,
        }
    }
}

/// Rejects bodies that are not a JSON `VerifyDomainRequest` before the handler runs.
#[handler]
pub(crate) async fn body_guard(req: &mut Request, res: &mut Response, ctrl: &mut FlowCtrl) {
    reject_unreadable_body::<VerifyDomainRequest>(req, res, ctrl).await;
}

/// Verify Domain Handler
///
/// Runs the ownership handshake against the domain and issues a claim token.
#[endpoint(
    tags("registration"),
    summary = "Verify Domain",
    responses(
        (status_code = 200, description = "Domain verified", body = VerifyDomainResponse),
        (status_code = 403, description = "Registration disabled or domain already registered"),
        (status_code = 422, description = "Invalid domain or handshake failed"),
        (status_code = 500, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<VerifyDomainRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let result = depot
        .app_state()?
        .registration
        .verify_domain(req.registration_context(), json.into_inner().into())
        .await;

    match result {
        Ok(verified) => res.render(Json(VerifyDomainResponse::from(verified))),
        Err(error) => render_error(error, res),
    }

    Ok(())
}
