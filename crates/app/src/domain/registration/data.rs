//! Registration Data

use crate::domain::registration::candidate::normalize_host;

/// Facts about the inbound request the platform was reached on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Host header (`host[:port]`) of the request.
    pub host: String,
    pub remote_addr: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(host: impl Into<String>, remote_addr: Option<String>) -> Self {
        Self {
            host: host.into(),
            remote_addr,
        }
    }

    /// Handshake source: the lowercased host the platform was reached on.
    #[must_use]
    pub fn source(&self) -> String {
        normalize_host(&self.host)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainVerificationRequest {
    pub site_domain: String,
}

/// Full self-registration payload. Missing fields arrive as empty strings and
/// fail validation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub site_domain: String,
    pub domain_token: String,
    pub username: String,
    pub password: String,
    pub real_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub site_name: Option<String>,
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("site_domain", &self.site_domain)
            .field("username", &self.username)
            .field("real_name", &self.real_name)
            .field("mobile", &self.mobile)
            .field("email", &self.email)
            .field("site_name", &self.site_name)
            .finish_non_exhaustive()
    }
}
