//! Role Data

use crate::domain::roles::records::RoleUuid;

/// New Role Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewRole {
    /// UUID to assign to the role row.
    pub uuid: RoleUuid,

    /// Unique role name.
    pub name: String,
}
