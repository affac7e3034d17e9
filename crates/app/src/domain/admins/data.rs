//! Admin User Data

use crate::domain::{admins::records::AdminUserUuid, sites::records::SiteUuid};

/// New Admin User Data
///
/// Self-registered admins are never super users; the flag is not settable here.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdminUser {
    pub uuid: AdminUserUuid,
    pub site_uuid: SiteUuid,
    pub username: String,

    /// Argon2id PHC string, never the plaintext password.
    pub password_hash: String,
    pub real_name: String,
    pub mobile: String,
    pub email: Option<String>,
}
