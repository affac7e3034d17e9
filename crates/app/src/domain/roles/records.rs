//! Role Records

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Role UUID
pub type RoleUuid = TypedUuid<RoleRecord>;

/// Role Record
#[derive(Debug, Clone)]
pub struct RoleRecord {
    /// Unique role identifier.
    pub uuid: RoleUuid,

    /// Unique role name.
    pub name: String,

    /// Role creation timestamp.
    pub created_at: Timestamp,

    /// Last update timestamp.
    pub updated_at: Timestamp,
}
