//! Admin User Records

use jiff::Timestamp;

use crate::{domain::sites::records::SiteUuid, uuids::TypedUuid};

/// Admin User UUID
pub type AdminUserUuid = TypedUuid<AdminUserRecord>;

/// Admin User Record
#[derive(Debug, Clone)]
pub struct AdminUserRecord {
    pub uuid: AdminUserUuid,
    pub site_uuid: SiteUuid,
    pub username: String,
    pub password_hash: String,
    pub real_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub is_super: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
