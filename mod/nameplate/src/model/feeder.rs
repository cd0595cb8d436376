use serde::{Deserialize, Serialize};

/// Voltage level of a bay/circuit. The ICT "level" groups the interconnecting
/// transformers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoltageLevel {
    #[serde(rename = "400KV")]
    Kv400,
    #[serde(rename = "220KV")]
    Kv220,
    #[serde(rename = "ICT")]
    Ict,
}

impl VoltageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoltageLevel::Kv400 => "400KV",
            VoltageLevel::Kv220 => "220KV",
            VoltageLevel::Ict => "ICT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "400KV" => Some(VoltageLevel::Kv400),
            "220KV" => Some(VoltageLevel::Kv220),
            "ICT" => Some(VoltageLevel::Ict),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoltageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// A named electrical bay/circuit at a voltage level. Equipment nameplates
/// belong to exactly one feeder. Identity (`code`) is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feeder {
    /// Feeder id (UUIDv4, no dashes).
    pub id: String,

    pub name: String,

    /// Short unique code, e.g. `400KV_NS-1`.
    pub code: String,

    pub voltage: VoltageLevel,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The fixed feeder catalog of the station, used by the idempotent seed
/// endpoint: (name, code, voltage).
pub const FEEDER_CATALOG: &[(&str, &str, VoltageLevel)] = &[
    // 400KV feeders
    ("400KV MAHESHWARAM-1", "400KV_MW-1", VoltageLevel::Kv400),
    ("400KV MAHESHWARAM-2", "400KV_MW-2", VoltageLevel::Kv400),
    ("400KV NARSAPUR-1", "400KV_NS-1", VoltageLevel::Kv400),
    ("400KV NARSAPUR-2", "400KV_NS-2", VoltageLevel::Kv400),
    ("400KV KETHIREDDYPALLY-1", "400KV_KP-1", VoltageLevel::Kv400),
    ("400KV KETHIREDDYPALLY-2", "400KV_KP-2", VoltageLevel::Kv400),
    ("400KV NIZAMABAD-1", "400KV_NZ-1", VoltageLevel::Kv400),
    ("400KV NIZAMABAD-2", "400KV_NZ-2", VoltageLevel::Kv400),
    // 220KV feeders
    ("220KV PARIGI-1", "220KV_PG-1", VoltageLevel::Kv220),
    ("220KV PARIGI-2", "220KV_PG-2", VoltageLevel::Kv220),
    ("220KV THANDUR", "220KV_TD", VoltageLevel::Kv220),
    ("220KV GACHIBOWLI-1", "220KV_GB-1", VoltageLevel::Kv220),
    ("220KV GACHIBOWLI-2", "220KV_GB-2", VoltageLevel::Kv220),
    ("220KV KETHIREDDYPALLY", "220KV_KP", VoltageLevel::Kv220),
    ("220KV YEDDUMAILARAM-1", "220KV_YM-1", VoltageLevel::Kv220),
    ("220KV YEDDUMAILARAM-2", "220KV_YM-2", VoltageLevel::Kv220),
    ("220KV SADASIVAPET-1", "220KV_SP-1", VoltageLevel::Kv220),
    ("220KV SADASIVAPET-2", "220KV_SP-2", VoltageLevel::Kv220),
    // ICTs
    ("315MVA ICT-1", "ICT-1", VoltageLevel::Ict),
    ("315MVA ICT-2", "ICT-2", VoltageLevel::Ict),
    ("315MVA ICT-3", "ICT-3", VoltageLevel::Ict),
    ("500MVA ICT-4", "ICT-4", VoltageLevel::Ict),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_level_round_trip() {
        for v in [VoltageLevel::Kv400, VoltageLevel::Kv220, VoltageLevel::Ict] {
            assert_eq!(VoltageLevel::parse(v.as_str()), Some(v));
        }
        assert_eq!(VoltageLevel::parse("132KV"), None);
    }

    #[test]
    fn voltage_level_serializes_as_label() {
        let json = serde_json::to_string(&VoltageLevel::Kv400).unwrap();
        assert_eq!(json, "\"400KV\"");
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut codes: Vec<&str> = FEEDER_CATALOG.iter().map(|(_, c, _)| *c).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), FEEDER_CATALOG.len());
    }
}
