//! Test infrastructure shared by service and repository tests.

pub(crate) mod helpers;

pub(crate) use context::TestContext;
