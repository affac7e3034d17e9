//! Site Records

use jiff::Timestamp;

use crate::{domain::admins::records::AdminUserUuid, uuids::TypedUuid};

/// Site UUID
pub type SiteUuid = TypedUuid<SiteRecord>;

/// Site Record
#[derive(Debug, Clone)]
pub struct SiteRecord {
    /// Unique site identifier.
    pub uuid: SiteUuid,

    /// Normalized `host[:port]` the site is bound to. Unique.
    pub domain: String,

    /// Display name.
    pub name: String,

    /// Secret path segment of the site's admin panel.
    pub admin_entry_path: String,

    /// Admin user that registered the site.
    pub owner_admin_uuid: AdminUserUuid,

    /// Site creation timestamp.
    pub created_at: Timestamp,

    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl SiteRecord {
    /// Path of the site's admin login page.
    #[must_use]
    pub fn login_url(&self) -> String {
        login_url(&self.admin_entry_path)
    }
}

/// Path of the admin login page for an admin entry path.
#[must_use]
pub fn login_url(admin_entry_path: &str) -> String {
    format!("/admin/{admin_entry_path}/login")
}
