//! Site self-registration endpoints

mod errors;
mod handlers;

pub(crate) use handlers::*;
