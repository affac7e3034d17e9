//! Registration Handlers

pub(crate) mod register;
pub(crate) mod verification;
pub(crate) mod verify_domain;
