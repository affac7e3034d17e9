//! Outbound HTTP for the verification handshake.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Url, redirect::Policy};
use thiserror::Error;

/// Default per-attempt handshake timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest response body read from a candidate domain. A responder answers
/// with a small JSON document.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

#[automock]
#[async_trait]
pub trait HandshakeTransport: Send + Sync {
    /// GET `url` and return the status and body, whatever the status code.
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// Certificates are not verified: candidate domains are often not yet served
/// with a valid certificate, and proof of control comes from the signed token.
/// Redirects are not followed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .user_agent(concat!("sitebind/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HandshakeTransport for ReqwestTransport {
    #[tracing::instrument(name = "registration.transport.get", skip(self), fields(url = %url), err)]
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let too_large = TransportError::BodyTooLarge {
            limit: MAX_RESPONSE_BYTES,
        };

        let declared = response
            .content_length()
            .map(|length| usize::try_from(length).unwrap_or(usize::MAX));

        if declared.is_some_and(|length| length > MAX_RESPONSE_BYTES) {
            return Err(too_large);
        }

        let mut body = Vec::new();

        while let Some(chunk) = response.chunk().await? {
            if body.len().saturating_add(chunk.len()) > MAX_RESPONSE_BYTES {
                return Err(too_large);
            }

            body.extend_from_slice(&chunk);
        }

        Ok(TransportResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
