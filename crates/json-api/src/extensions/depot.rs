//! Depot helper extensions.

use std::sync::Arc;

use salvo::prelude::{Depot, StatusError};
use tracing::error;

use crate::state::State;

/// Access to the injected handler state.
pub(crate) trait DepotExt {
    /// Shared [`State`], or a 500 when the router was built without it.
    fn app_state(&self) -> Result<&Arc<State>, StatusError>;
}

impl DepotExt for Depot {
    fn app_state(&self) -> Result<&Arc<State>, StatusError> {
        self.obtain::<Arc<State>>().map_err(|_missing| {
            error!("handler state was not injected");

            StatusError::internal_server_error()
        })
    }
}
