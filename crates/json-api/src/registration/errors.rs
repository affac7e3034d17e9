//! Registration error responses.
//!
//! Request problems become field-scoped JSON maps (`{"site_domain": "..."}`)
//! so a form can show them next to the offending input. Server-side failures
//! are logged in full and answered with a bare 500.

use salvo::{http::mime, oapi::ToSchema, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, warn};

use sitebind_app::domain::registration::{
    RegistrationError,
    rules::{DOMAIN_TOKEN_FIELD, SITE_DOMAIN_FIELD, ValidationErrors},
};

/// Body for errors that are not tied to a single field.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Field reported when the request body cannot be read as the expected JSON.
pub(crate) const BODY_FIELD: &str = "body";

/// Answer 422 `{"body": ...}` and stop the flow unless the request carries a
/// JSON body that deserializes as `T`.
pub(crate) async fn reject_unreadable_body<T: DeserializeOwned>(
    req: &mut Request,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let is_json = req
        .content_type()
        .is_some_and(|content_type| content_type.subtype() == mime::JSON);

    let problem = if is_json {
        match req.payload().await {
            Ok(bytes) => serde_json::from_slice::<T>(bytes)
                .err()
                .map(|error| error.to_string()),
            Err(error) => Some(error.to_string()),
        }
    } else {
        Some("request body must be JSON".to_string())
    };

    if let Some(message) = problem {
        debug!(%message, "unreadable request body");

        res.status_code(StatusCode::UNPROCESSABLE_ENTITY);
        res.render(Json(ValidationErrors::field(BODY_FIELD, message)));
        ctrl.skip_rest();
    }
}

pub(crate) fn render_error(error: RegistrationError, res: &mut Response) {
    let message = error.to_string();

    match error {
        RegistrationError::Disabled => {
            res.status_code(StatusCode::FORBIDDEN);
            res.render(Json(MessageResponse { message }));
        }
        RegistrationError::DomainTaken => {
            res.status_code(StatusCode::FORBIDDEN);
            res.render(Json(ValidationErrors::field(SITE_DOMAIN_FIELD, message)));
        }
        RegistrationError::Validation(errors) => {
            res.status_code(StatusCode::UNPROCESSABLE_ENTITY);
            res.render(Json(errors));
        }
        RegistrationError::Handshake(failure) => {
            for attempt in &failure.report.attempts {
                warn!(
                    domain = %failure.report.domain,
                    scheme = attempt.scheme.as_str(),
                    url = %attempt.url,
                    status = attempt.status,
                    outcome = attempt.outcome.as_str(),
                    "handshake attempt failed: {}",
                    attempt.message
                );
            }

            res.status_code(StatusCode::UNPROCESSABLE_ENTITY);
            res.render(Json(ValidationErrors::field(SITE_DOMAIN_FIELD, message)));
        }
        RegistrationError::ClaimToken(_) => {
            res.status_code(StatusCode::UNPROCESSABLE_ENTITY);
            res.render(Json(ValidationErrors::field(DOMAIN_TOKEN_FIELD, message)));
        }
        RegistrationError::DefaultRoleMissing
        | RegistrationError::Password(_)
        | RegistrationError::Sql(_) => {
            error!(kind = error.kind(), "registration failed: {error:?}");

            res.render(StatusError::internal_server_error());
        }
    }
}
