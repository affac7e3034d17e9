//! Register Site Handler

use std::fmt;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sitebind_app::domain::registration::{data::RegistrationRequest, records::ProvisionedSite};

use crate::{
    extensions::*,
    registration::errors::{reject_unreadable_body, render_error},
};

/// Register Site Request
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct RegisterSiteRequest {
    pub site_domain: String,
    /// Claim token from domain verification
    pub domain_token: String,
    pub username: String,
    pub password: String,
    pub real_name: String,
    pub mobile: String,
    pub email: Option<String>,
    /// Display name of the new site, defaults to the domain
    pub site_name: Option<String>,
}

impl fmt::Debug for RegisterSiteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterSiteRequest")
            .field("site_domain", &self.site_domain)
            .field("username", &self.username)
            .field("site_name", &self.site_name)
            .finish_non_exhaustive()
    }
}

impl From<RegisterSiteRequest> for RegistrationRequest {
    fn from(request: RegisterSiteRequest) -> Self {
        RegistrationRequest {
            site_domain: request.site_domain,
            domain_token: request.domain_token,
            username: request.username,
            password: request.password,
            real_name: request.real_name,
            mobile: request.mobile,
            email: request.email,
            site_name: request.site_name,
        }
    }
}

/// Site Registered Response
///
/// The password is echoed once so the registrant can sign in.
#[derive(Serialize, Deserialize, ToSchema)]
pub(crate) struct SiteRegisteredResponse {
    pub site_uuid: Uuid,
    pub domain: String,
    pub name: String,
    pub admin_entry_path: String,
    /// Admin login path, `/admin/{admin_entry_path}/login`
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub role_name: String,
}

impl fmt::Debug for SiteRegisteredResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteRegisteredResponse")
            .field("site_uuid", &self.site_uuid)
            .field("domain", &self.domain)
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<ProvisionedSite> for SiteRegisteredResponse {
    fn from(site: ProvisionedSite) -> Self {
        SiteRegisteredResponse {
            site_uuid: site.site_uuid.into_uuid(),
            domain: site.domain,
            name: site.name,
            admin_entry_path: site.admin_entry_path,
            login_url: site.login_url,
            username: site.username,
            password: site.password,
            role_name: site.role_name,
        }
    }
}

/// Rejects bodies that are not a JSON `RegisterSiteRequest` before the handler runs.
#[handler]
pub(crate) async fn body_guard(req: &mut Request, res: &mut Response, ctrl: &mut FlowCtrl) {
    reject_unreadable_body::<RegisterSiteRequest>(req, res, ctrl).await;
}

/// Register Site Handler
///
/// Provisions a site, its first admin user and the default role link for a
/// verified domain.
#[endpoint(
    tags("registration"),
    summary = "Register Site",
    responses(
        (status_code = 200, description = "Site registered", body = SiteRegisteredResponse),
        (status_code = 403, description = "Registration disabled or domain already registered"),
        (status_code = 422, description = "Invalid registration data or domain token"),
        (status_code = 500, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<RegisterSiteRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let result = depot
        .app_state()?
        .registration
        .register(req.registration_context(), json.into_inner().into())
        .await;

    match result {
        Ok(site) => res.render(Json(SiteRegisteredResponse::from(site))),
        Err(error) => render_error(error, res),
    }

    Ok(())
}
