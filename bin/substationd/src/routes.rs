//! Route registration — module routes, system endpoints, upload serving.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use substation_auth::TokenAuthenticator;
use substation_auth::middleware::write_guard;
use substation_blob::{BlobStore, FileStore};

/// Build the complete router.
///
/// Module routers are self-contained (state already applied); they are all
/// mounted under `/api`. The write guard wraps everything — it only bites on
/// mutating equipment requests.
pub fn build_router(
    module_routes: Vec<(&str, Router)>,
    authenticator: Arc<TokenAuthenticator>,
    uploads: Option<Arc<FileStore>>,
) -> Router {
    let mut api = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));
    for (_, router) in module_routes {
        api = api.merge(router);
    }

    let mut app = Router::new().nest("/api", api);

    if let Some(store) = uploads {
        app = app.route("/uploads/{key}", get(serve_upload).with_state(store));
    }

    app.layer(middleware::from_fn_with_state(authenticator, write_guard))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"ok": true}))
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "substationd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve a stored nameplate photo. Keys are flat `{id}.{ext}` names; the
/// blob store rejects anything that could escape the uploads directory.
async fn serve_upload(State(store): State<Arc<FileStore>>, Path(key): Path<String>) -> Response {
    match store.get(&key) {
        Ok(Some(bytes)) => {
            let content_type = match key.rsplit('.').next() {
                Some("jpg") | Some("jpeg") => "image/jpeg",
                Some("png") => "image/png",
                _ => "application/octet-stream",
            };
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Ok(None) | Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
