use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::json;
use sql::Value;
use substation_core::{ServiceError, merge_patch, new_id, now_rfc3339};

use super::{ImageMode, NameplateService, escape_like};
use crate::coerce::coerce_document;
use crate::model::{
    EquipmentRecord, EquipmentType, SUB_RECORD_KEYS, SubRecord, VoltageLevel, guard_payload_shape,
};

/// Practical cap for an in-memory-buffered nameplate photo.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_PAGE_SIZE: usize = 12;
const MAX_PAGE_SIZE: usize = 500;

/// An uploaded photo, fully buffered.
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct CreateEquipmentInput {
    /// Defaults to the configured station when absent or blank.
    pub station: Option<String>,
    pub voltage: VoltageLevel,
    pub feeder_id: String,
    pub equipment_type: EquipmentType,
    pub title: String,
    /// Decoded nameplate payload; leaves are coerced before storage.
    pub payload: serde_json::Map<String, serde_json::Value>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Default)]
pub struct EquipmentFilters {
    pub voltage: Option<VoltageLevel>,
    pub feeder_id: Option<String>,
    pub equipment_type: Option<EquipmentType>,
    /// Case-insensitive substring match against title or feeder name.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EquipmentPage {
    pub items: Vec<EquipmentRecord>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

fn image_extension(content_type: &str) -> Result<&'static str, ServiceError> {
    match content_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        other => Err(ServiceError::Validation(format!(
            "unsupported image type '{}': only JPG and PNG are accepted",
            other
        ))),
    }
}

/// The blob key behind an `/uploads/...` image URL, if any. Inline data URIs
/// have no blob to manage.
fn blob_key(image_url: &str) -> Option<&str> {
    image_url.strip_prefix("/uploads/")
}

/// A validated photo whose URL is known but whose blob has not been written.
struct StagedImage {
    url: String,
    key: Option<String>,
}

impl NameplateService {
    pub fn create_equipment(
        &self,
        input: CreateEquipmentInput,
    ) -> Result<EquipmentRecord, ServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::Validation("title is required".into()));
        }

        let feeder = self.get_feeder(&input.feeder_id).map_err(|e| match e {
            ServiceError::NotFound(_) => ServiceError::Validation("invalid feeder".into()),
            other => other,
        })?;

        guard_payload_shape(&input.payload)?;
        let mut payload = input.payload;
        coerce_document(&mut payload);
        let sub = SubRecord::from_payload(input.equipment_type, &payload)?;

        let id = new_id();
        let now = now_rfc3339();
        let image_url = match &input.image {
            Some(img) => Some(self.store_image(&id, img)?),
            None => None,
        };

        let station = input
            .station
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.station.clone());

        let record = EquipmentRecord {
            id: id.clone(),
            station,
            voltage: input.voltage,
            feeder_id: feeder.id.clone(),
            feeder_name: feeder.name.clone(),
            equipment_type: input.equipment_type,
            title,
            image_url,
            sub,
            created_at: Some(now.clone()),
            updated_at: Some(now.clone()),
        };

        let inserted = self.insert_record(
            "equipment",
            &id,
            &record,
            &[
                ("station", Value::Text(record.station.clone())),
                ("voltage", Value::Text(record.voltage.as_str().to_string())),
                ("feeder_id", Value::Text(record.feeder_id.clone())),
                ("feeder_name", Value::Text(record.feeder_name.clone())),
                (
                    "equipment_type",
                    Value::Text(record.equipment_type.as_str().to_string()),
                ),
                ("title", Value::Text(record.title.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        );

        if let Err(e) = inserted {
            // The row never landed, so the stored photo is orphaned.
            self.discard_image(record.image_url.as_deref());
            return Err(e);
        }

        tracing::info!(
            id = %record.id,
            equipment_type = %record.equipment_type,
            feeder = %record.feeder_name,
            "equipment record created"
        );
        Ok(record)
    }

    pub fn get_equipment(&self, id: &str) -> Result<EquipmentRecord, ServiceError> {
        self.get_record("equipment", id)
    }

    pub fn list_equipment(
        &self,
        filters: &EquipmentFilters,
        page: PageParams,
    ) -> Result<EquipmentPage, ServiceError> {
        let limit = page.limit.clamp(1, MAX_PAGE_SIZE);
        let page_no = page.page.max(1);
        let offset = (page_no - 1) * limit;

        let mut where_clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(v) = filters.voltage {
            params.push(Value::Text(v.as_str().to_string()));
            where_clauses.push(format!("voltage = ?{}", params.len()));
        }
        if let Some(ref fid) = filters.feeder_id {
            params.push(Value::Text(fid.clone()));
            where_clauses.push(format!("feeder_id = ?{}", params.len()));
        }
        if let Some(t) = filters.equipment_type {
            params.push(Value::Text(t.as_str().to_string()));
            where_clauses.push(format!("equipment_type = ?{}", params.len()));
        }
        if let Some(q) = filters.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
            params.push(Value::Text(pattern));
            let i = params.len();
            where_clauses.push(format!(
                "(LOWER(title) LIKE ?{i} ESCAPE '\\' OR LOWER(feeder_name) LIKE ?{i} ESCAPE '\\')"
            ));
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) as cnt FROM equipment{}", where_sql);
        let rows = self
            .sql
            .query(&count_sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT data FROM equipment{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql, limit_idx, offset_idx,
        );
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            items.push(
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?,
            );
        }

        Ok(EquipmentPage {
            items,
            total,
            page: page_no,
            pages: total.div_ceil(limit),
        })
    }

    /// Partial update. Only supplied envelope fields and sub-record leaves
    /// change; `id` and `createdAt` are immutable and the image is replaced
    /// only through an upload, never through the JSON patch.
    pub fn update_equipment(
        &self,
        id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
        image: Option<ImageUpload>,
    ) -> Result<EquipmentRecord, ServiceError> {
        let current: EquipmentRecord = self.get_record("equipment", id)?;

        guard_payload_shape(&patch)?;
        let mut patch = patch;
        coerce_document(&mut patch);
        patch.shift_remove("id");
        patch.shift_remove("createdAt");
        patch.shift_remove("imageUrl");

        // A feeder change must resolve and re-snapshots the feeder name.
        if let Some(fid) = patch.get("feederId").and_then(|v| v.as_str()) {
            if fid != current.feeder_id {
                let feeder = self.get_feeder(fid).map_err(|e| match e {
                    ServiceError::NotFound(_) => {
                        ServiceError::Validation("invalid feeder".into())
                    }
                    other => other,
                })?;
                patch.insert("feederName".into(), json!(feeder.name));
            }
        }

        let mut doc =
            serde_json::to_value(&current).map_err(|e| ServiceError::Internal(e.to_string()))?;

        // A type change abandons the old type's block.
        let mut final_type = current.equipment_type;
        if let Some(ty) = patch.get("equipmentType").and_then(|v| v.as_str()) {
            let parsed = EquipmentType::parse(ty).ok_or_else(|| {
                ServiceError::Validation(format!("unknown equipment type '{}'", ty))
            })?;
            if parsed != current.equipment_type {
                if let Some(obj) = doc.as_object_mut() {
                    obj.shift_remove(current.equipment_type.key());
                }
                final_type = parsed;
            }
        }

        patch.insert("updatedAt".into(), json!(now_rfc3339()));
        merge_patch(&mut doc, &serde_json::Value::Object(patch));

        // Exactly one sub-record block survives: the final type's, or the
        // generic attrs fallback when no typed block is present.
        if let Some(obj) = doc.as_object_mut() {
            let keep = if obj.contains_key(final_type.key()) {
                final_type.key()
            } else {
                "attrs"
            };
            obj.retain(|k, _| k == keep || !SUB_RECORD_KEYS.contains(&k.as_str()));
        }

        // The replacement photo is validated now but written only after the
        // patched row has landed. A 400 or 409 below must not clobber the
        // stored blob, which shares the record's key.
        let staged = match &image {
            Some(img) => Some(self.stage_image(id, img)?),
            None => None,
        };
        if let Some(staged) = &staged {
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("imageUrl".into(), json!(staged.url));
            }
        }

        let updated: EquipmentRecord = serde_json::from_value(doc)
            .map_err(|e| ServiceError::Validation(format!("patched record is invalid: {}", e)))?;
        if updated.title.trim().is_empty() {
            return Err(ServiceError::Validation("title is required".into()));
        }

        let now = updated.updated_at.clone().unwrap_or_else(now_rfc3339);
        self.update_record(
            "equipment",
            id,
            &updated,
            &[
                ("station", Value::Text(updated.station.clone())),
                ("voltage", Value::Text(updated.voltage.as_str().to_string())),
                ("feeder_id", Value::Text(updated.feeder_id.clone())),
                ("feeder_name", Value::Text(updated.feeder_name.clone())),
                (
                    "equipment_type",
                    Value::Text(updated.equipment_type.as_str().to_string()),
                ),
                ("title", Value::Text(updated.title.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;

        if let (Some(staged), Some(img)) = (staged, image) {
            if let Some(key) = staged.key {
                self.blob
                    .put(&key, &img.bytes)
                    .map_err(|e| ServiceError::Storage(e.to_string()))?;
                if let Some(old_key) = current.image_url.as_deref().and_then(blob_key) {
                    // Same id, so the key only changes when the extension does.
                    if old_key != key {
                        self.discard_image(current.image_url.as_deref());
                    }
                }
            }
        }

        Ok(updated)
    }

    pub fn delete_equipment(&self, id: &str) -> Result<(), ServiceError> {
        let record: EquipmentRecord = self.get_record("equipment", id)?;
        self.delete_record("equipment", id)?;
        self.discard_image(record.image_url.as_deref());
        tracing::info!(id, "equipment record deleted");
        Ok(())
    }

    /// Validate an uploaded photo and work out where it will live, without
    /// writing anything yet.
    fn stage_image(&self, id: &str, image: &ImageUpload) -> Result<StagedImage, ServiceError> {
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::Validation(format!(
                "image exceeds the {} MB limit",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        let ext = image_extension(&image.content_type)?;
        match self.image_mode {
            ImageMode::Uploads => {
                let key = format!("{}.{}", id, ext);
                Ok(StagedImage {
                    url: format!("/uploads/{}", key),
                    key: Some(key),
                })
            }
            ImageMode::Inline => Ok(StagedImage {
                url: format!(
                    "data:{};base64,{}",
                    image.content_type,
                    BASE64.encode(&image.bytes)
                ),
                key: None,
            }),
        }
    }

    /// Store an uploaded photo, returning the URL to put on the record.
    fn store_image(&self, id: &str, image: &ImageUpload) -> Result<String, ServiceError> {
        let staged = self.stage_image(id, image)?;
        if let Some(key) = &staged.key {
            self.blob
                .put(key, &image.bytes)
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        Ok(staged.url)
    }

    /// Best-effort blob removal for an image URL that no longer belongs to a
    /// stored record.
    fn discard_image(&self, image_url: Option<&str>) {
        if let Some(key) = image_url.and_then(blob_key) {
            if let Err(e) = self.blob.delete(key) {
                tracing::warn!(key, error = %e, "failed to delete image blob");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use blob::{BlobStore, FileStore};
    use sql::SqliteStore;

    use super::*;

    fn service(mode: ImageMode) -> (NameplateService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sql = SqliteStore::open_in_memory().unwrap();
        let blob = FileStore::open(&dir.path().join("uploads")).unwrap();
        let svc = NameplateService::new(
            Box::new(sql),
            Box::new(blob),
            "400kV Shankarpally".into(),
            mode,
        )
        .unwrap();
        svc.seed_feeders().unwrap();
        (svc, dir)
    }

    fn feeder_named(svc: &NameplateService, name: &str) -> crate::model::Feeder {
        svc.list_feeders(None)
            .unwrap()
            .into_iter()
            .find(|f| f.name == name)
            .unwrap()
    }

    fn ct_input(feeder_id: &str, title: &str) -> CreateEquipmentInput {
        CreateEquipmentInput {
            station: None,
            voltage: VoltageLevel::Kv400,
            feeder_id: feeder_id.to_string(),
            equipment_type: EquipmentType::Ct,
            title: title.to_string(),
            payload: json!({"ct": {"ratedCurrentA": "2000 A", "ratio": "2000/1A"}})
                .as_object()
                .unwrap()
                .clone(),
            image: None,
        }
    }

    #[test]
    fn create_coerces_and_snapshots_feeder_name() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let record = svc.create_equipment(ct_input(&feeder.id, "CT Bay A")).unwrap();

        assert_eq!(record.station, "400kV Shankarpally");
        assert_eq!(record.feeder_name, "400KV NARSAPUR-1");
        match &record.sub {
            Some(SubRecord::Ct(ct)) => {
                assert_eq!(ct.rated_current_a, Some(2000.0));
                assert_eq!(ct.ratio.as_deref(), Some("2000/1A"));
            }
            other => panic!("wrong sub-record: {:?}", other),
        }

        let doc = serde_json::to_value(svc.get_equipment(&record.id).unwrap()).unwrap();
        assert_eq!(doc["ct"]["ratedCurrentA"], json!(2000.0));
    }

    #[test]
    fn duplicate_bay_position_conflicts() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        svc.create_equipment(ct_input(&feeder.id, "CT Bay A")).unwrap();
        let err = svc
            .create_equipment(ct_input(&feeder.id, "CT Bay A"))
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        // Different title on the same feeder is fine.
        svc.create_equipment(ct_input(&feeder.id, "CT Bay B")).unwrap();
    }

    #[test]
    fn create_rejects_unknown_feeder_and_blank_title() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let err = svc.create_equipment(ct_input("nope", "CT Bay A")).unwrap_err();
        assert_eq!(err.to_string(), "invalid feeder");

        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let err = svc.create_equipment(ct_input(&feeder.id, "   ")).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn create_rejects_scalar_sub_record_without_persisting() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CB Bay A");
        input.equipment_type = EquipmentType::Cb;
        input.payload = json!({"cb": "not-an-object"}).as_object().unwrap().clone();

        let err = svc.create_equipment(input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        let page = svc
            .list_equipment(&EquipmentFilters::default(), PageParams::default())
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn update_merges_leaves_and_keeps_siblings() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let record = svc.create_equipment(ct_input(&feeder.id, "CT Bay A")).unwrap();

        let patch = json!({"ct": {"manufacturer": "BHEL"}})
            .as_object()
            .unwrap()
            .clone();
        let updated = svc.update_equipment(&record.id, patch, None).unwrap();

        assert_eq!(updated.id, record.id);
        assert_eq!(updated.created_at, record.created_at);
        match &updated.sub {
            Some(SubRecord::Ct(ct)) => {
                assert_eq!(ct.manufacturer.as_deref(), Some("BHEL"));
                assert_eq!(ct.rated_current_a, Some(2000.0));
            }
            other => panic!("wrong sub-record: {:?}", other),
        }
    }

    #[test]
    fn update_feeder_change_resyncs_name_snapshot() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let other = feeder_named(&svc, "400KV NARSAPUR-2");
        let record = svc.create_equipment(ct_input(&feeder.id, "CT Bay A")).unwrap();

        let patch = json!({"feederId": other.id}).as_object().unwrap().clone();
        let updated = svc.update_equipment(&record.id, patch, None).unwrap();
        assert_eq!(updated.feeder_id, other.id);
        assert_eq!(updated.feeder_name, "400KV NARSAPUR-2");

        let patch = json!({"feederId": "missing"}).as_object().unwrap().clone();
        let err = svc.update_equipment(&record.id, patch, None).unwrap_err();
        assert_eq!(err.to_string(), "invalid feeder");
    }

    #[test]
    fn update_type_change_drops_the_old_block() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let record = svc.create_equipment(ct_input(&feeder.id, "Bay A")).unwrap();

        let patch = json!({"equipmentType": "CB", "cb": {"ratedVoltageKV": "420 kV"}})
            .as_object()
            .unwrap()
            .clone();
        let updated = svc.update_equipment(&record.id, patch, None).unwrap();
        assert_eq!(updated.equipment_type, EquipmentType::Cb);
        match &updated.sub {
            Some(SubRecord::Cb(cb)) => assert_eq!(cb.rated_voltage_kv, Some(420.0)),
            other => panic!("old block survived: {:?}", other),
        }
    }

    #[test]
    fn list_paginates_and_searches() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        for title in ["CT Bay A", "CT Bay B", "CT Bay C"] {
            svc.create_equipment(ct_input(&feeder.id, title)).unwrap();
        }

        let page = svc
            .list_equipment(
                &EquipmentFilters::default(),
                PageParams { page: 1, limit: 2 },
            )
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pages, 2);

        let hits = svc
            .list_equipment(
                &EquipmentFilters {
                    q: Some("bay b".into()),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].title, "CT Bay B");

        // Substring match against the feeder name too.
        let hits = svc
            .list_equipment(
                &EquipmentFilters {
                    q: Some("narsapur".into()),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .unwrap();
        assert_eq!(hits.total, 3);
    }

    #[test]
    fn uploads_mode_stores_blob_and_cleans_up_on_delete() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: b"jpeg-bytes".to_vec(),
            content_type: "image/jpeg".into(),
        });
        let record = svc.create_equipment(input).unwrap();

        let key = format!("{}.jpg", record.id);
        assert_eq!(record.image_url.as_deref(), Some(&*format!("/uploads/{}", key)));
        assert!(svc.blob.exists(&key).unwrap());

        svc.delete_equipment(&record.id).unwrap();
        assert!(!svc.blob.exists(&key).unwrap());
        assert_eq!(
            svc.get_equipment(&record.id).unwrap_err().error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            svc.delete_equipment(&record.id).unwrap_err().error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn inline_mode_embeds_a_data_uri() {
        let (svc, _dir) = service(ImageMode::Inline);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: b"png-bytes".to_vec(),
            content_type: "image/png".into(),
        });
        let record = svc.create_equipment(input).unwrap();
        let url = record.image_url.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn year_and_serial_strings_survive_the_round_trip() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.payload = json!({"ct": {"year": "2004", "serialNo": "12345"}})
            .as_object()
            .unwrap()
            .clone();
        let record = svc.create_equipment(input).unwrap();

        let fetched = svc.get_equipment(&record.id).unwrap();
        match &fetched.sub {
            Some(SubRecord::Ct(ct)) => {
                assert_eq!(ct.year.as_deref(), Some("2004"));
                assert_eq!(ct.serial_no.as_deref(), Some("12345"));
            }
            other => panic!("wrong sub-record: {:?}", other),
        }
    }

    #[test]
    fn update_accepts_a_numeric_looking_title() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let record = svc.create_equipment(ct_input(&feeder.id, "CT Bay A")).unwrap();

        let patch = json!({"title": "2000"}).as_object().unwrap().clone();
        let updated = svc.update_equipment(&record.id, patch, None).unwrap();
        assert_eq!(updated.title, "2000");
        assert_eq!(svc.get_equipment(&record.id).unwrap().title, "2000");
    }

    #[test]
    fn failed_update_never_replaces_the_stored_image() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: b"original-jpeg".to_vec(),
            content_type: "image/jpeg".into(),
        });
        let record = svc.create_equipment(input).unwrap();
        svc.create_equipment(ct_input(&feeder.id, "CT Bay B")).unwrap();
        let key = format!("{}.jpg", record.id);

        // Title collision: the 409 must leave the old bytes in place.
        let patch = json!({"title": "CT Bay B"}).as_object().unwrap().clone();
        let replacement = ImageUpload {
            bytes: b"replacement-jpeg".to_vec(),
            content_type: "image/jpeg".into(),
        };
        let err = svc
            .update_equipment(&record.id, patch, Some(replacement))
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        assert_eq!(svc.blob.get(&key).unwrap().unwrap(), b"original-jpeg");

        // Invalid patch likewise.
        let patch = json!({"voltage": "9KV"}).as_object().unwrap().clone();
        let replacement = ImageUpload {
            bytes: b"replacement-jpeg".to_vec(),
            content_type: "image/jpeg".into(),
        };
        let err = svc
            .update_equipment(&record.id, patch, Some(replacement))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert_eq!(svc.blob.get(&key).unwrap().unwrap(), b"original-jpeg");
        assert_eq!(
            svc.get_equipment(&record.id).unwrap().image_url.as_deref(),
            Some(&*format!("/uploads/{}", key))
        );
    }

    #[test]
    fn update_replaces_the_image_and_retires_the_old_key() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");
        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: b"original-jpeg".to_vec(),
            content_type: "image/jpeg".into(),
        });
        let record = svc.create_equipment(input).unwrap();

        let replacement = ImageUpload {
            bytes: b"replacement-png".to_vec(),
            content_type: "image/png".into(),
        };
        let updated = svc
            .update_equipment(&record.id, serde_json::Map::new(), Some(replacement))
            .unwrap();

        let png_key = format!("{}.png", record.id);
        assert_eq!(
            updated.image_url.as_deref(),
            Some(&*format!("/uploads/{}", png_key))
        );
        assert_eq!(svc.blob.get(&png_key).unwrap().unwrap(), b"replacement-png");
        assert!(!svc.blob.exists(&format!("{}.jpg", record.id)).unwrap());
    }

    #[test]
    fn concurrent_duplicate_creates_yield_one_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let sql = SqliteStore::open(&dir.path().join("data.sqlite")).unwrap();
        let blob = FileStore::open(&dir.path().join("uploads")).unwrap();
        let svc = NameplateService::new(
            Box::new(sql),
            Box::new(blob),
            "400kV Shankarpally".into(),
            ImageMode::Uploads,
        )
        .unwrap();
        svc.seed_feeders().unwrap();
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let svc = &svc;
                    let feeder_id = feeder.id.clone();
                    s.spawn(move || svc.create_equipment(ct_input(&feeder_id, "CT Bay A")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.error_code() == "ALREADY_EXISTS"))
            .count();
        assert_eq!((ok, conflicts), (1, 1));
    }

    #[test]
    fn image_validation_happens_before_persisting() {
        let (svc, _dir) = service(ImageMode::Uploads);
        let feeder = feeder_named(&svc, "400KV NARSAPUR-1");

        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: b"gif-bytes".to_vec(),
            content_type: "image/gif".into(),
        });
        let err = svc.create_equipment(input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let mut input = ct_input(&feeder.id, "CT Bay A");
        input.image = Some(ImageUpload {
            bytes: vec![0u8; MAX_IMAGE_BYTES + 1],
            content_type: "image/jpeg".into(),
        });
        let err = svc.create_equipment(input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let page = svc
            .list_equipment(&EquipmentFilters::default(), PageParams::default())
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
