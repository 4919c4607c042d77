use std::sync::Arc;

use service::Services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    /// Mark the auth cookie `Secure` (behind TLS).
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services: Arc::new(services), secure_cookies: false }
    }
}
