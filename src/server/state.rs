//! Shared handler state.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::nearby::NearbyService;

/// State shared by every request handler.
pub struct AppState {
    /// Nearby queries, location updates and sharing settings.
    pub service: NearbyService,
    /// Resolves bearer credentials to user IDs.
    pub authenticator: Arc<dyn Authenticator>,
}

/// Handle passed to the router.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wraps the service and authenticator for use as router state.
    #[must_use]
    pub fn new(service: NearbyService, authenticator: Arc<dyn Authenticator>) -> SharedState {
        Arc::new(Self {
            service,
            authenticator,
        })
    }
}
