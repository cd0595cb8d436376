use sql::Value;
use substation_core::{ServiceError, new_id, now_rfc3339};

use super::NameplateService;
use crate::model::{FEEDER_CATALOG, Feeder, VoltageLevel};

/// Result of an idempotent seed run.
#[derive(Debug)]
pub struct SeedOutcome {
    /// How many catalog entries were newly inserted this run.
    pub created: usize,
    /// The full catalog as stored, sorted by voltage then name.
    pub feeders: Vec<Feeder>,
}

impl NameplateService {
    /// Seed the fixed feeder catalog. Existing rows (matched on voltage+name)
    /// are left untouched, so repeated runs are safe.
    pub fn seed_feeders(&self) -> Result<SeedOutcome, ServiceError> {
        let mut created = 0;
        for (name, code, voltage) in FEEDER_CATALOG {
            if self.feeder_exists(*voltage, name)? {
                continue;
            }
            let id = new_id();
            let now = now_rfc3339();
            let record = Feeder {
                id: id.clone(),
                name: (*name).to_string(),
                code: (*code).to_string(),
                voltage: *voltage,
                enabled: true,
                created_at: Some(now.clone()),
                updated_at: Some(now.clone()),
            };
            self.insert_record(
                "feeders",
                &id,
                &record,
                &[
                    ("name", Value::Text(record.name.clone())),
                    ("code", Value::Text(record.code.clone())),
                    ("voltage", Value::Text(voltage.as_str().to_string())),
                    ("created_at", Value::Text(now.clone())),
                    ("updated_at", Value::Text(now)),
                ],
            )?;
            created += 1;
        }
        tracing::info!(created, "feeder seed complete");
        Ok(SeedOutcome {
            created,
            feeders: self.list_feeders(None)?,
        })
    }

    fn feeder_exists(&self, voltage: VoltageLevel, name: &str) -> Result<bool, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT id FROM feeders WHERE voltage = ?1 AND name = ?2",
                &[
                    Value::Text(voltage.as_str().to_string()),
                    Value::Text(name.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    /// List feeders, optionally restricted to one voltage level, sorted by
    /// voltage then name.
    pub fn list_feeders(&self, voltage: Option<VoltageLevel>) -> Result<Vec<Feeder>, ServiceError> {
        let (sql, params): (&str, Vec<Value>) = match voltage {
            Some(v) => (
                "SELECT data FROM feeders WHERE voltage = ?1 ORDER BY voltage, name",
                vec![Value::Text(v.as_str().to_string())],
            ),
            None => ("SELECT data FROM feeders ORDER BY voltage, name", vec![]),
        };
        let rows = self
            .sql
            .query(sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut feeders = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            feeders
                .push(serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?);
        }
        Ok(feeders)
    }

    pub fn get_feeder(&self, id: &str) -> Result<Feeder, ServiceError> {
        self.get_record("feeders", id)
    }
}

#[cfg(test)]
mod tests {
    use blob::FileStore;
    use sql::SqliteStore;

    use super::super::ImageMode;
    use super::*;

    fn service() -> (NameplateService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sql = SqliteStore::open_in_memory().unwrap();
        let blob = FileStore::open(&dir.path().join("uploads")).unwrap();
        let svc = NameplateService::new(
            Box::new(sql),
            Box::new(blob),
            "400kV Shankarpally".into(),
            ImageMode::Uploads,
        )
        .unwrap();
        (svc, dir)
    }

    #[test]
    fn seed_is_idempotent() {
        let (svc, _dir) = service();
        let first = svc.seed_feeders().unwrap();
        assert_eq!(first.created, FEEDER_CATALOG.len());
        assert_eq!(first.feeders.len(), FEEDER_CATALOG.len());

        let again = svc.seed_feeders().unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.feeders.len(), FEEDER_CATALOG.len());

        // Existing rows keep their ids across runs.
        assert_eq!(
            first.feeders.iter().map(|f| &f.id).collect::<Vec<_>>(),
            again.feeders.iter().map(|f| &f.id).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn list_sorts_by_voltage_then_name() {
        let (svc, _dir) = service();
        svc.seed_feeders().unwrap();
        let feeders = svc.list_feeders(None).unwrap();
        let keys: Vec<(String, String)> = feeders
            .iter()
            .map(|f| (f.voltage.as_str().to_string(), f.name.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn list_filters_by_voltage() {
        let (svc, _dir) = service();
        svc.seed_feeders().unwrap();
        let icts = svc.list_feeders(Some(VoltageLevel::Ict)).unwrap();
        assert_eq!(icts.len(), 4);
        assert!(icts.iter().all(|f| f.voltage == VoltageLevel::Ict));
    }
}
