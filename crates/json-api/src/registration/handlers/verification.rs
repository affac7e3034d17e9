//! Verification Responder Handler

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use sitebind_app::domain::registration::{
    candidate::{PAYLOAD_SEPARATOR, normalize_host},
    proof::ProofResponse,
};

use crate::extensions::*;

/// Verification Proof Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerificationResponse {
    /// Hex HMAC-SHA256 of `payload`
    pub token: String,
    /// Host this request was received on
    pub domain: String,
    pub source: String,
    pub challenge: String,
    /// `domain|source|challenge`
    pub payload: String,
    pub algorithm: String,
}

impl From<ProofResponse> for VerificationResponse {
    fn from(proof: ProofResponse) -> Self {
        VerificationResponse {
            token: proof.token,
            domain: proof.domain,
            source: proof.source,
            challenge: proof.challenge,
            payload: proof.payload,
            algorithm: proof.algorithm.to_string(),
        }
    }
}

/// Verification Rejected Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerificationRejectedResponse {
    /// Always null
    pub token: Option<String>,
    pub message: String,
}

fn reject(res: &mut Response, message: &str) {
    res.status_code(StatusCode::BAD_REQUEST);
    res.render(Json(VerificationRejectedResponse {
        token: None,
        message: message.to_string(),
    }));
}

/// Verification Responder Handler
///
/// Signs a challenge for the host this request arrived on, proving to a
/// registering platform that this deployment serves that domain.
#[endpoint(
    tags("registration"),
    summary = "Answer Verification Challenge",
    responses(
        (status_code = 200, description = "Signed proof", body = VerificationResponse),
        (status_code = 400, description = "Missing or malformed parameters", body = VerificationRejectedResponse),
    ),
)]
pub(crate) async fn handler(
    source: QueryParam<String, false>,
    challenge: QueryParam<String, false>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let source = source.into_inner().unwrap_or_default();
    let challenge = challenge.into_inner().unwrap_or_default();

    if source.trim().is_empty() || challenge.trim().is_empty() {
        reject(res, "source and challenge are required");

        return Ok(());
    }

    if source.contains(PAYLOAD_SEPARATOR) || challenge.contains(PAYLOAD_SEPARATOR) {
        reject(res, "source and challenge must not contain '|'");

        return Ok(());
    }

    let domain = normalize_host(&req.request_host());

    if domain.is_empty() {
        reject(res, "request host is unknown");

        return Ok(());
    }

    let proof = depot
        .app_state()?
        .registration
        .respond_to_challenge(&domain, &source, &challenge);

    res.render(Json(VerificationResponse::from(proof)));

    Ok(())
}
