//! Extension traits

mod depot;
mod request;

pub(crate) use depot::DepotExt as _;
pub(crate) use request::RequestExt as _;
