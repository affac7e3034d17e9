//! Site Data

use crate::domain::{admins::records::AdminUserUuid, sites::records::SiteUuid};

/// New Site Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    /// UUID to assign to the site row.
    pub uuid: SiteUuid,

    /// Normalized domain the site is bound to.
    pub domain: String,

    /// Display name.
    pub name: String,

    /// Secret path segment of the site's admin panel.
    pub admin_entry_path: String,

    /// Admin user that owns the site, inserted in the same transaction.
    pub owner_admin_uuid: AdminUserUuid,
}
