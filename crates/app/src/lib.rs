//! Shared application domain, persistence and signing modules.

pub mod context;
pub mod database;
pub mod domain;
pub mod passwords;
pub mod signing;

#[cfg(test)]
mod test;

mod uuids;

pub use uuids::TypedUuid;
