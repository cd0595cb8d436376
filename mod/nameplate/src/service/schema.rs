use sql::SQLStore;
use substation_core::ServiceError;

/// SQL DDL statements to initialize the nameplate database schema.
///
/// Each table stores the full JSON document in a `data` TEXT column, with
/// indexed columns extracted for filtering and uniqueness. The composite
/// constraint on equipment enforces one record per bay position; the feeder
/// constraints back the idempotent seed.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS feeders (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT,
        code TEXT UNIQUE,
        voltage TEXT,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(voltage, name)
    )",
    "CREATE TABLE IF NOT EXISTS equipment (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        station TEXT,
        voltage TEXT,
        feeder_id TEXT,
        feeder_name TEXT,
        equipment_type TEXT,
        title TEXT,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(feeder_id, equipment_type, title)
    )",
    "CREATE INDEX IF NOT EXISTS idx_equipment_voltage ON equipment(voltage)",
    "CREATE INDEX IF NOT EXISTS idx_equipment_feeder ON equipment(feeder_id)",
    "CREATE INDEX IF NOT EXISTS idx_equipment_type ON equipment(equipment_type)",
];

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
