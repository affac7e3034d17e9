//! State

use std::sync::Arc;

use sitebind_app::{context::AppContext, domain::registration::RegistrationService};

/// Shared handler state injected into every request.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) registration: Arc<dyn RegistrationService>,
}

impl State {
    #[must_use]
    pub(crate) fn new(registration: Arc<dyn RegistrationService>) -> Self {
        Self { registration }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: &AppContext) -> Arc<Self> {
        Arc::new(Self::new(app.registration.clone()))
    }
}
