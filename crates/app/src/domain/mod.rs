//! Sitebind Domain Concerns

pub mod admins;
pub mod registration;
pub mod roles;
pub mod sites;
