pub mod api;
pub mod middleware;
pub mod service;
pub mod token;

use std::sync::Arc;

use axum::Router;
use substation_core::Module;

pub use service::{AuthConfig, AuthService};
pub use token::{Claims, TokenAuthenticator, DEV_SECRET};

/// Auth module — operator login and bearer-token issuance.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(service: AuthService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// The token authenticator, shared with the write-guard middleware.
    pub fn authenticator(&self) -> Arc<TokenAuthenticator> {
        self.service.authenticator()
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
