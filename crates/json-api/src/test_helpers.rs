//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};

use sitebind_app::domain::registration::MockRegistrationService;

use crate::state::State;

pub(crate) fn state_with_registration(registration: MockRegistrationService) -> Arc<State> {
    Arc::new(State::new(Arc::new(registration)))
}

/// Serve `route` with a mocked registration service. Unexpected calls on the
/// mock fail the test.
pub(crate) fn registration_service(registration: MockRegistrationService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_registration(registration)))
            .push(route),
    )
}
