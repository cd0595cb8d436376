use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};

use substation_core::ServiceError;

use crate::service::AuthService;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body. The client stores the token and sends it back as
/// `Authorization: Bearer <token>` on writes.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Build the auth API router, mounted under `/api` by the binary.
pub fn router(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .with_state(service)
}

async fn login(
    State(svc): State<Arc<AuthService>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let token = svc.login(&body.username, &body.password)?;
    Ok(Json(LoginResponse { token }))
}
