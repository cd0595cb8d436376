//! Leaf value coercion.
//!
//! Nameplate attributes arrive as free text transcribed from the physical
//! plate, units included ("2000 A", "12.5% ±10%"). A fixed per-type
//! allow-list names the numeric fields; for those the first numeric token is
//! extracted. Fields off the list only become numbers when the whole trimmed
//! text parses, so codes like an insulation level "1300/570" stay strings.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::model::SUB_RECORD_KEYS;

static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").unwrap_or_else(|e| panic!("numeric token regex: {e}"))
});

/// Field paths (type-key prefixed) whose values are numeric quantities.
static NUMERIC_PATHS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    const COMMON_SWITCHGEAR: &[&str] = &[
        "ratedVoltageKV",
        "ratedCurrentA",
        "frequencyHz",
        "insulationImpulseKVp",
        "insulationPowerFreqKV",
    ];
    let mut set = HashSet::new();
    let mut add = |prefix: &'static str, fields: &[&'static str]| {
        for f in fields {
            let path: &'static str = format!("{prefix}.{f}").leak();
            set.insert(path);
        }
    };

    add(
        "ct",
        &[
            "highestSystemVoltageKV",
            "frequencyHz",
            "basicInsulationLevelKVp",
            "ithKA_1s",
            "idynKA",
            "ratedThermalCurrentA",
            "ratedContinuousCurrentA",
            "ratedExtendedPrimaryCurrentA",
            "ratedPrimaryCurrentA",
            "ratedSecondaryCurrentA",
            "outputVA",
            "ratedBurdenVA",
            "creepageDistanceMm",
            "resistanceAt75C_Ohm",
            "kneePointVoltageVk",
            "excitationCurrentAtVk_mA",
            "oilWeightKg",
            "totalWeightKg",
            "ratedVoltageKV",
            "ratedCurrentA",
            "burdenVA",
            "shortTimeCurrentKA_3s",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
        ],
    );
    add(
        "cvt",
        &[
            "ratedVoltageKV",
            "burdenVA",
            "frequencyHz",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
        ],
    );
    add(
        "ict",
        &[
            "powerMVA",
            "primaryKV",
            "secondaryKV",
            "tertiaryKV",
            "numPhases",
            "frequencyHz",
            "impedancePercent",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
            "ratedVoltageAtNoLoad.hv",
            "ratedVoltageAtNoLoad.iv",
            "ratedVoltageAtNoLoad.lv",
            "ratedLineCurrent.hv",
            "ratedLineCurrent.iv",
            "ratedLineCurrent.lv",
            "temperature.maxTempRiseOilC",
            "temperature.maxTempRiseWindingC",
            "temperature.overAmbientTempC",
            "mass.coreAndWindingsKg",
            "mass.totalMassKg",
            "mass.transportMassKg",
            "mass.untankingMassKg",
            "mass.oilVolumeLiters",
            "impedanceVoltage.baseMVA",
            "impedanceVoltage.guaranteed.hv_iv",
            "impedanceVoltage.guaranteed.hv_lv",
            "impedanceVoltage.guaranteed.iv_lv",
            "impedanceVoltage.measured.hv_iv",
            "impedanceVoltage.measured.hv_lv",
            "impedanceVoltage.measured.iv_lv",
            "losses.noLoadKW",
            "losses.loadKW",
            "losses.coolerKW",
        ],
    );
    add(
        "pt",
        &[
            "highestSystemVoltageKV",
            "frequencyHz",
            "creepageDistanceMm",
            "totalWeightKg",
            "oilWeightKg",
            "ratedBurdenVA",
            "primaryVoltageKV",
            "ratedVoltageKV",
            "ratedCurrentA",
            "burdenVA",
            "shortTimeCurrentKA_3s",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
        ],
    );
    add("cb", COMMON_SWITCHGEAR);
    add("isolator", COMMON_SWITCHGEAR);
    add("busbar", COMMON_SWITCHGEAR);
    add(
        "la",
        &[
            "ratedVoltageKV",
            "energyAbsorptionJ",
            "frequencyHz",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
        ],
    );
    add(
        "wavetrap",
        &[
            "ratedVoltageKV",
            "impedanceOhm",
            "frequencyHz",
            "insulationImpulseKVp",
            "insulationPowerFreqKV",
        ],
    );
    set
});

/// Integer-looking text stays integral. String-typed fields (a year, a bare
/// serial number) round-trip through numeric inference and must keep their
/// display form, so "2004" may not become 2004.0.
fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(Number::from(i)));
    }
    let n: f64 = text.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    Number::from_f64(n).map(Value::Number)
}

/// Coerce one raw text leaf at `path` (type-key prefixed, dotted).
///
/// Never fails: text that resists numeric extraction is stored as entered.
pub fn coerce(path: &str, raw: &str) -> Value {
    if raw == "true" {
        return Value::Bool(true);
    }
    if raw == "false" {
        return Value::Bool(false);
    }

    if NUMERIC_PATHS.contains(path) {
        if let Some(m) = NUMERIC_TOKEN.find(raw) {
            if let Some(v) = parse_number(m.as_str()) {
                return v;
            }
        }
        return Value::String(raw.to_string());
    }

    let trimmed = raw.trim();
    if let Some(v) = parse_number(trimmed) {
        return v;
    }
    Value::String(trimmed.to_string())
}

/// Coerce every string leaf of the typed sub-record blocks in place.
///
/// Only keys naming a typed block are walked. Envelope fields (title,
/// station, ...) are plain strings however numeric they look, and the
/// generic `attrs` block is display text by contract.
pub fn coerce_document(doc: &mut Map<String, Value>) {
    for (key, value) in doc.iter_mut() {
        if key == "attrs" || !SUB_RECORD_KEYS.contains(&key.as_str()) {
            continue;
        }
        coerce_value(key, value);
    }
}

fn coerce_value(path: &str, value: &mut Value) {
    match value {
        Value::String(s) => *value = coerce(path, s),
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                coerce_value(&format!("{path}.{key}"), child);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                coerce_value(path, child);
            }
        }
        _ => {}
    }
}
