//! Registration Records

use std::fmt;

use crate::domain::sites::records::SiteUuid;

/// A verified domain and the claim token that lets it be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDomain {
    pub token: String,
    pub domain: String,
    pub expires_in: u64,
}

/// Result of a successful registration.
///
/// Carries the plaintext password so it can be shown to the registrant once.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisionedSite {
    pub site_uuid: SiteUuid,
    pub domain: String,
    pub name: String,
    pub admin_entry_path: String,
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub role_name: String,
}

impl fmt::Debug for ProvisionedSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionedSite")
            .field("site_uuid", &self.site_uuid)
            .field("domain", &self.domain)
            .field("name", &self.name)
            .field("admin_entry_path", &self.admin_entry_path)
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"**redacted**")
            .field("role_name", &self.role_name)
            .finish()
    }
}
