//! Equipment record endpoints.
//!
//! Create and update accept either `multipart/form-data` (flat bracket/dot
//! field paths plus an optional `image` file part, the shape a browser form
//! submits) or a plain JSON body. Multipart field paths go through the
//! field-path codec; value typing happens in the service.

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use substation_core::ServiceError;

use super::AppState;
use crate::fieldpath::nest;
use crate::model::{EquipmentRecord, EquipmentType, VoltageLevel};
use crate::service::equipment::{
    CreateEquipmentInput, DEFAULT_PAGE_SIZE, EquipmentFilters, EquipmentPage, ImageUpload,
    PageParams,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/equipment", get(list_equipment).post(create_equipment))
        .route(
            "/equipment/{id}",
            get(get_equipment)
                .put(update_equipment)
                .delete(delete_equipment),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentQuery {
    voltage: Option<String>,
    feeder_id: Option<String>,
    equipment_type: Option<String>,
    q: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

async fn list_equipment(
    State(svc): State<AppState>,
    Query(q): Query<EquipmentQuery>,
) -> Result<Json<EquipmentPage>, ServiceError> {
    let voltage = match q.voltage.as_deref() {
        Some(v) => Some(VoltageLevel::parse(v).ok_or_else(|| {
            ServiceError::Validation(format!("unknown voltage level '{}'", v))
        })?),
        None => None,
    };
    let equipment_type = match q.equipment_type.as_deref() {
        Some(t) => Some(EquipmentType::parse(t).ok_or_else(|| {
            ServiceError::Validation(format!("unknown equipment type '{}'", t))
        })?),
        None => None,
    };
    let filters = EquipmentFilters {
        voltage,
        feeder_id: q.feeder_id,
        equipment_type,
        q: q.q,
    };
    let page = svc.list_equipment(
        &filters,
        PageParams {
            page: q.page,
            limit: q.limit,
        },
    )?;
    Ok(Json(page))
}

async fn get_equipment(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EquipmentRecord>, ServiceError> {
    Ok(Json(svc.get_equipment(&id)?))
}

async fn create_equipment(
    State(svc): State<AppState>,
    req: Request,
) -> Result<(StatusCode, Json<EquipmentRecord>), ServiceError> {
    let (mut doc, image) = decode_request(req).await?;

    let voltage_raw = take_string(&mut doc, "voltage")?
        .ok_or_else(|| ServiceError::Validation("voltage is required".into()))?;
    let voltage = VoltageLevel::parse(&voltage_raw).ok_or_else(|| {
        ServiceError::Validation(format!("unknown voltage level '{}'", voltage_raw))
    })?;
    let type_raw = take_string(&mut doc, "equipmentType")?
        .ok_or_else(|| ServiceError::Validation("equipmentType is required".into()))?;
    let equipment_type = EquipmentType::parse(&type_raw).ok_or_else(|| {
        ServiceError::Validation(format!("unknown equipment type '{}'", type_raw))
    })?;
    let feeder_id = take_string(&mut doc, "feederId")?
        .ok_or_else(|| ServiceError::Validation("feederId is required".into()))?;
    let title = take_string(&mut doc, "title")?
        .ok_or_else(|| ServiceError::Validation("title is required".into()))?;
    let station = take_string(&mut doc, "station")?;

    let record = svc.create_equipment(CreateEquipmentInput {
        station,
        voltage,
        feeder_id,
        equipment_type,
        title,
        payload: doc,
        image,
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_equipment(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Json<EquipmentRecord>, ServiceError> {
    let (doc, image) = decode_request(req).await?;
    Ok(Json(svc.update_equipment(&id, doc, image)?))
}

async fn delete_equipment(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_equipment(&id)?;
    Ok(Json(json!({"message": "deleted"})))
}

/// Pull one envelope string out of the decoded document.
fn take_string(
    doc: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<String>, ServiceError> {
    match doc.shift_remove(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ServiceError::Validation(format!(
            "field '{}' must be a string",
            key
        ))),
    }
}

/// Decode a create/update request into a nested document plus the optional
/// image part.
async fn decode_request(
    req: Request,
) -> Result<(serde_json::Map<String, serde_json::Value>, Option<ImageUpload>), ServiceError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body) = Json::<serde_json::Value>::from_request(req, &())
            .await
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        return match body {
            serde_json::Value::Object(map) => Ok((map, None)),
            _ => Err(ServiceError::Validation(
                "request body must be a JSON object".into(),
            )),
        };
    }

    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    let mut fields: Vec<(String, serde_json::Value)> = Vec::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            image = Some(ImageUpload {
                bytes: bytes.to_vec(),
                content_type,
            });
        } else if !name.is_empty() {
            let text = field
                .text()
                .await
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            fields.push((name, serde_json::Value::String(text)));
        }
    }

    Ok((nest(fields), image))
}
