use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use substation_core::ServiceError;

use super::AppState;
use crate::model::{Feeder, VoltageLevel};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feeders", get(list_feeders))
        .route("/feeders/seed", post(seed_feeders))
}

#[derive(Deserialize)]
struct FeederQuery {
    voltage: Option<String>,
}

#[derive(Serialize)]
struct SeedResponse {
    ok: bool,
    count: usize,
    feeders: Vec<Feeder>,
}

async fn list_feeders(
    State(svc): State<AppState>,
    Query(q): Query<FeederQuery>,
) -> Result<Json<Vec<Feeder>>, ServiceError> {
    let voltage = match q.voltage.as_deref() {
        Some(v) => Some(VoltageLevel::parse(v).ok_or_else(|| {
            ServiceError::Validation(format!("unknown voltage level '{}'", v))
        })?),
        None => None,
    };
    Ok(Json(svc.list_feeders(voltage)?))
}

async fn seed_feeders(State(svc): State<AppState>) -> Result<Json<SeedResponse>, ServiceError> {
    let outcome = svc.seed_feeders()?;
    Ok(Json(SeedResponse {
        ok: true,
        count: outcome.feeders.len(),
        feeders: outcome.feeders,
    }))
}
