//! Site Self-Registration
//!
//! A visitor proves control of a domain through a signed challenge-response
//! handshake, receives a short-lived claim token for it, and then exchanges
//! that token for a freshly provisioned site, admin user and role link.

pub mod audit;
pub mod candidate;
pub mod claim;
pub mod data;
pub mod errors;
pub mod handshake;
pub mod proof;
pub mod records;
pub mod rules;
pub mod service;
pub mod settings;
pub mod stage;
pub mod transport;

pub use errors::RegistrationError;
pub use service::*;
