pub mod equipment;
pub mod feeders;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;

use crate::service::NameplateService;

/// Shared application state.
pub type AppState = Arc<NameplateService>;

/// Body cap: a 10 MB photo plus form fields and multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Build the nameplate API router, mounted under `/api` by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(feeders::routes())
        .merge(equipment::routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
