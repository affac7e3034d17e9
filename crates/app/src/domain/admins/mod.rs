//! Admin Users

pub mod data;
pub mod records;
pub(crate) mod repository;
