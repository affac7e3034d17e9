//! App Router

use salvo::Router;

use crate::registration::{register, verification, verify_domain};

pub fn app_router() -> Router {
    Router::with_path("site")
        .push(
            Router::with_path("register")
                .push(
                    Router::new()
                        .hoop(register::body_guard)
                        .post(register::handler),
                )
                .push(
                    Router::with_path("verify-domain")
                        .hoop(verify_domain::body_guard)
                        .post(verify_domain::handler),
                ),
        )
        .push(Router::with_path("verification").get(verification::handler))
}

#[cfg(test)]
mod tests {
    use salvo::{
        http::StatusCode,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use sitebind_app::domain::registration::{
        MockRegistrationService, RegistrationError, proof::ProofResponse,
    };

    use crate::test_helpers::registration_service;

    use super::*;

    #[tokio::test]
    async fn test_routes_reach_their_handlers() -> TestResult {
        let mut registration = MockRegistrationService::new();

        registration
            .expect_verify_domain()
            .once()
            .return_once(|_, _| Err(RegistrationError::Disabled));
        registration
            .expect_register()
            .once()
            .return_once(|_, _| Err(RegistrationError::Disabled));
        registration
            .expect_respond_to_challenge()
            .once()
            .returning(|domain, source, challenge| ProofResponse {
                token: "t".to_string(),
                domain: domain.to_string(),
                source: source.to_string(),
                challenge: challenge.to_string(),
                payload: String::new(),
                algorithm: "HMAC-SHA256",
            });

        let service = registration_service(registration, app_router());

        let verify = TestClient::post("http://example.com/site/register/verify-domain")
            .json(&json!({ "site_domain": "example.com" }))
            .send(&service)
            .await;
        let register = TestClient::post("http://example.com/site/register")
            .json(&json!({}))
            .send(&service)
            .await;
        let mut answer = TestClient::get("http://example.com/site/verification?source=a&challenge=b")
            .send(&service)
            .await;

        assert_eq!(verify.status_code, Some(StatusCode::FORBIDDEN));
        assert_eq!(register.status_code, Some(StatusCode::FORBIDDEN));
        assert_eq!(answer.status_code, Some(StatusCode::OK));

        let body: Value = answer.take_json().await?;

        assert_eq!(body.get("domain"), Some(&json!("example.com")));

        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_bodies_are_field_errors() -> TestResult {
        let service = registration_service(MockRegistrationService::new(), app_router());

        let mut malformed = TestClient::post("http://example.com/site/register/verify-domain")
            .raw_json("{\"site_domain\": ")
            .send(&service)
            .await;
        let mut mistyped = TestClient::post("http://example.com/site/register")
            .json(&json!({ "site_domain": "shop.example.com", "email": 5 }))
            .send(&service)
            .await;
        let mut not_json = TestClient::post("http://example.com/site/register")
            .text("site_domain=shop.example.com")
            .send(&service)
            .await;

        for res in [&mut malformed, &mut mistyped, &mut not_json] {
            assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

            let body: Value = res.take_json().await?;
            let fields: Vec<_> = body.as_object().map(|map| map.keys().collect()).unwrap_or_default();

            assert_eq!(fields, ["body"], "unexpected body: {body}");
        }

        Ok(())
    }
}
