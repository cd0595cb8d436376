use serde::{Deserialize, Serialize};
use serde_json::Value;

use substation_core::ServiceError;

use super::feeder::VoltageLevel;

/// Equipment type discriminant. Selects which sub-record schema applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EquipmentType {
    Ct,
    Cvt,
    Ict,
    Cb,
    Isolator,
    La,
    Pt,
    Busbar,
    Wavetrap,
}

impl EquipmentType {
    pub const ALL: &'static [EquipmentType] = &[
        EquipmentType::Ct,
        EquipmentType::Cvt,
        EquipmentType::Ict,
        EquipmentType::Cb,
        EquipmentType::Isolator,
        EquipmentType::La,
        EquipmentType::Pt,
        EquipmentType::Busbar,
        EquipmentType::Wavetrap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Ct => "CT",
            EquipmentType::Cvt => "CVT",
            EquipmentType::Ict => "ICT",
            EquipmentType::Cb => "CB",
            EquipmentType::Isolator => "ISOLATOR",
            EquipmentType::La => "LA",
            EquipmentType::Pt => "PT",
            EquipmentType::Busbar => "BUSBAR",
            EquipmentType::Wavetrap => "WAVETRAP",
        }
    }

    /// The JSON key of this type's sub-record block.
    pub fn key(&self) -> &'static str {
        match self {
            EquipmentType::Ct => "ct",
            EquipmentType::Cvt => "cvt",
            EquipmentType::Ict => "ict",
            EquipmentType::Cb => "cb",
            EquipmentType::Isolator => "isolator",
            EquipmentType::La => "la",
            EquipmentType::Pt => "pt",
            EquipmentType::Busbar => "busbar",
            EquipmentType::Wavetrap => "wavetrap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserialization helpers for free-text nameplate fields.
///
/// Numeric inference upstream can turn entries like a year or a bare serial
/// number into JSON numbers; string-typed fields accept those and keep the
/// display form.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value;

    pub fn opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(de)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected a string, got {}",
                other
            ))),
        }
    }

    pub fn string<'de, D>(de: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_string(de)?.unwrap_or_default())
    }
}

/// One generic nameplate attribute for equipment without a dedicated schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttrPair {
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: String,
}

// ── Type-specific sub-records ───────────────────────────────────────
//
// One struct per equipment type, mirroring the detailed nameplate attribute
// sets transcribed from the physical plates. Legacy short-form fields are
// kept alongside the detailed ones; existing records use both.

/// Current transformer nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CtNameplate {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(rename = "highestSystemVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub highest_system_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub reference_standard: Option<String>,

    #[serde(rename = "basicInsulationLevelKVp", default, skip_serializing_if = "Option::is_none")]
    pub basic_insulation_level_kvp: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub insulation_level: Option<String>,

    #[serde(rename = "ithKA_1s", default, skip_serializing_if = "Option::is_none")]
    pub ith_ka_1s: Option<f64>,
    #[serde(rename = "idynKA", default, skip_serializing_if = "Option::is_none")]
    pub idyn_ka: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_thermal_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_continuous_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_extended_primary_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_primary_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_secondary_current_a: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(rename = "ratioOutput2000to1", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub ratio_output_2000_to_1: Option<String>,

    #[serde(rename = "outputVA", default, skip_serializing_if = "Option::is_none")]
    pub output_va: Option<f64>,
    #[serde(rename = "ratedBurdenVA", default, skip_serializing_if = "Option::is_none")]
    pub rated_burden_va: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub isf_or_alf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creepage_distance_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub cores: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub primary_connection: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub secondary_connection: Option<String>,

    #[serde(rename = "resistanceAt75C_Ohm", default, skip_serializing_if = "Option::is_none")]
    pub resistance_at_75c_ohm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knee_point_voltage_vk: Option<f64>,
    #[serde(rename = "excitationCurrentAtVk_mA", default, skip_serializing_if = "Option::is_none")]
    pub excitation_current_at_vk_ma: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight_kg: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub so_no: Option<String>,

    // Legacy short-form fields.
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_current_a: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_metering: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_protection: Option<String>,
    #[serde(rename = "burdenVA", default, skip_serializing_if = "Option::is_none")]
    pub burden_va: Option<f64>,
    #[serde(rename = "shortTimeCurrentKA_3s", default, skip_serializing_if = "Option::is_none")]
    pub short_time_current_ka_3s: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Capacitor voltage transformer nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CvtNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(rename = "secondaryVoltageV", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub secondary_voltage_v: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_metering: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_protection: Option<String>,
    #[serde(rename = "burdenVA", default, skip_serializing_if = "Option::is_none")]
    pub burden_va: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plcc_coupling: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// HV/IV/LV figures for one winding-level quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WindingTriple {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lv: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_rise_oil_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_rise_winding_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_ambient_temp_c: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MassFigures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_and_windings_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untanking_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_volume_liters: Option<f64>,
}

/// Pairwise impedance figures between windings (% on base MVA).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImpedancePairs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hv_iv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hv_lv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv_lv: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImpedanceVoltage {
    #[serde(rename = "baseMVA", default, skip_serializing_if = "Option::is_none")]
    pub base_mva: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guaranteed: Option<ImpedancePairs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<ImpedancePairs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Losses {
    #[serde(rename = "noLoadKW", default, skip_serializing_if = "Option::is_none")]
    pub no_load_kw: Option<f64>,
    #[serde(rename = "loadKW", default, skip_serializing_if = "Option::is_none")]
    pub load_kw: Option<f64>,
    #[serde(rename = "coolerKW", default, skip_serializing_if = "Option::is_none")]
    pub cooler_kw: Option<f64>,
}

/// Insulation levels per winding, kept as strings to allow composite values
/// like `650/275`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InsulationLevels {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub hv: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub lv: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
}

/// Interconnecting transformer nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IctNameplate {
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub makers_serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub connection_symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vector_group: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub cooling: Option<String>,

    #[serde(rename = "powerMVA", default, skip_serializing_if = "Option::is_none")]
    pub power_mva: Option<f64>,
    #[serde(rename = "primaryKV", default, skip_serializing_if = "Option::is_none")]
    pub primary_kv: Option<f64>,
    #[serde(rename = "secondaryKV", default, skip_serializing_if = "Option::is_none")]
    pub secondary_kv: Option<f64>,
    #[serde(rename = "tertiaryKV", default, skip_serializing_if = "Option::is_none")]
    pub tertiary_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_at_no_load: Option<WindingTriple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_line_current: Option<WindingTriple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_phases: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub diagram_drg_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub oga_drawing_no: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureRise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<MassFigures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance_voltage: Option<ImpedanceVoltage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<Losses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_level: Option<InsulationLevels>,

    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance_percent: Option<f64>,
}

/// Potential transformer nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PtNameplate {
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub so_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(rename = "highestSystemVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub highest_system_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub insulation_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub voltage_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creepage_distance_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub secondary_voltages: Option<String>,
    #[serde(rename = "ratedBurdenVA", default, skip_serializing_if = "Option::is_none")]
    pub rated_burden_va: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_class: Option<String>,
    #[serde(rename = "primaryVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub primary_voltage_kv: Option<f64>,

    // Legacy short-form fields.
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_current_a: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_metering: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub accuracy_protection: Option<String>,
    #[serde(rename = "burdenVA", default, skip_serializing_if = "Option::is_none")]
    pub burden_va: Option<f64>,
    #[serde(rename = "shortTimeCurrentKA_3s", default, skip_serializing_if = "Option::is_none")]
    pub short_time_current_ka_3s: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Circuit breaker nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CbNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_current_a: Option<f64>,
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Isolator (disconnector) nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IsolatorNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_current_a: Option<f64>,
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Lightning arrester nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_absorption_j: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Busbar nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusbarNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_current_a: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

/// Wave trap (line trap) nameplate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WavetrapNameplate {
    #[serde(rename = "ratedVoltageKV", default, skip_serializing_if = "Option::is_none")]
    pub rated_voltage_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance_ohm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(rename = "insulationImpulseKVp", default, skip_serializing_if = "Option::is_none")]
    pub insulation_impulse_kvp: Option<f64>,
    #[serde(rename = "insulationPowerFreqKV", default, skip_serializing_if = "Option::is_none")]
    pub insulation_power_freq_kv: Option<f64>,
}

// ── Sub-record union ────────────────────────────────────────────────

/// All sub-record JSON keys, including the generic `attrs` fallback. Used by
/// the payload shape guard before any merge happens.
pub const SUB_RECORD_KEYS: &[&str] = &[
    "ct", "cvt", "ict", "pt", "cb", "isolator", "la", "busbar", "wavetrap", "attrs",
];

/// The type-specific nameplate block of a record, keyed by the lowercased
/// equipment type in JSON (`{"ct": {...}}`). `Attrs` is the generic fallback
/// of ordered key/value string pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SubRecord {
    Ct(CtNameplate),
    Cvt(CvtNameplate),
    Ict(IctNameplate),
    Pt(PtNameplate),
    Cb(CbNameplate),
    Isolator(IsolatorNameplate),
    La(LaNameplate),
    Busbar(BusbarNameplate),
    Wavetrap(WavetrapNameplate),
    Attrs(Vec<AttrPair>),
}

impl SubRecord {
    /// The JSON key this block serializes under.
    pub fn key(&self) -> &'static str {
        match self {
            SubRecord::Ct(_) => "ct",
            SubRecord::Cvt(_) => "cvt",
            SubRecord::Ict(_) => "ict",
            SubRecord::Pt(_) => "pt",
            SubRecord::Cb(_) => "cb",
            SubRecord::Isolator(_) => "isolator",
            SubRecord::La(_) => "la",
            SubRecord::Busbar(_) => "busbar",
            SubRecord::Wavetrap(_) => "wavetrap",
            SubRecord::Attrs(_) => "attrs",
        }
    }

    /// Build the sub-record for `ty` from a decoded payload object.
    ///
    /// Only the declared type's block is taken; blocks for other types in the
    /// payload are ignored so they are never stored. A payload carrying only
    /// `attrs` falls back to the generic variant.
    pub fn from_payload(
        ty: EquipmentType,
        payload: &serde_json::Map<String, Value>,
    ) -> Result<Option<Self>, ServiceError> {
        if let Some(v) = payload.get(ty.key()) {
            let sub = match ty {
                EquipmentType::Ct => SubRecord::Ct(decode_block(ty.key(), v)?),
                EquipmentType::Cvt => SubRecord::Cvt(decode_block(ty.key(), v)?),
                EquipmentType::Ict => SubRecord::Ict(decode_block(ty.key(), v)?),
                EquipmentType::Pt => SubRecord::Pt(decode_block(ty.key(), v)?),
                EquipmentType::Cb => SubRecord::Cb(decode_block(ty.key(), v)?),
                EquipmentType::Isolator => SubRecord::Isolator(decode_block(ty.key(), v)?),
                EquipmentType::La => SubRecord::La(decode_block(ty.key(), v)?),
                EquipmentType::Busbar => SubRecord::Busbar(decode_block(ty.key(), v)?),
                EquipmentType::Wavetrap => SubRecord::Wavetrap(decode_block(ty.key(), v)?),
            };
            return Ok(Some(sub));
        }
        if let Some(v) = payload.get("attrs") {
            return Ok(Some(SubRecord::Attrs(decode_block("attrs", v)?)));
        }
        Ok(None)
    }
}

fn decode_block<T: serde::de::DeserializeOwned>(key: &str, v: &Value) -> Result<T, ServiceError> {
    serde_json::from_value(v.clone())
        .map_err(|e| ServiceError::Validation(format!("invalid '{}' attributes: {}", key, e)))
}

/// Reject payloads that would overwrite a structured sub-record with a
/// scalar, e.g. `{"cb": "oops"}`. Runs before any merge. A `null` block is
/// allowed: under merge-patch it deletes the block rather than corrupting it.
pub fn guard_payload_shape(payload: &serde_json::Map<String, Value>) -> Result<(), ServiceError> {
    for key in SUB_RECORD_KEYS {
        if let Some(v) = payload.get(*key) {
            let ok = if *key == "attrs" {
                v.is_null() || v.is_array()
            } else {
                v.is_null() || v.is_object()
            };
            if !ok {
                return Err(ServiceError::Validation(format!(
                    "field '{}' must be {}",
                    key,
                    if *key == "attrs" { "an array" } else { "an object" },
                )));
            }
        }
    }
    Ok(())
}

// ── Equipment record ────────────────────────────────────────────────

/// A stored nameplate record: shared envelope plus exactly one type-specific
/// block (flattened into the JSON document under its own key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRecord {
    /// Record id (UUIDv4, no dashes).
    pub id: String,

    /// Site name; defaults to the configured station.
    pub station: String,

    pub voltage: VoltageLevel,

    /// Weak reference to the owning feeder. Must resolve at write time.
    pub feeder_id: String,

    /// Snapshot of the feeder's name at write time; not live-updated.
    pub feeder_name: String,

    pub equipment_type: EquipmentType,

    /// Human label for the bay position, e.g. "CT Bay A".
    pub title: String,

    /// `/uploads/{key}` path or inline `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(flatten)]
    pub sub: Option<SubRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
