pub mod api;
pub mod coerce;
pub mod fieldpath;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use substation_core::Module;

use service::NameplateService;

/// Nameplate module — substation equipment nameplate record keeping.
pub struct NameplateModule {
    service: Arc<NameplateService>,
}

impl NameplateModule {
    pub fn new(service: NameplateService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Module for NameplateModule {
    fn name(&self) -> &str {
        "nameplate"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
