//! Deterministic subscore heuristics. Each function maps one category's
//! metrics to an integer in `0..=100`.
//!
//! Battery, memory and CPU thermal scoring are provisional placeholders; their
//! thresholds are kept exact so existing report fixtures stay comparable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{value_to_int, SmartRecord};

pub const STORAGE_UNKNOWN: u8 = 50;
pub const STORAGE_FAILING: u8 = 30;
pub const STORAGE_WORN: u8 = 40;
pub const STORAGE_HEALTHY: u8 = 90;

const NVME_WEAR_LIMIT: i64 = 70;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatteryInfo {
    #[serde(default)]
    pub health_pct: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryInfo {
    #[serde(default)]
    pub errors: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThermalInfo {
    #[serde(default)]
    pub cpu_temps_c: Vec<f32>,
}

pub fn score_storage(record: &SmartRecord) -> u8 {
    if !record.has_health_data() {
        return STORAGE_UNKNOWN;
    }
    // Sector failures outrank NVMe wear.
    let pending = record.attribute_int("Current_Pending_Sector");
    let reallocated = record.attribute_int("Reallocated_Sector_Ct");
    if pending > 0 || reallocated > 0 {
        return STORAGE_FAILING;
    }
    if record
        .percentage_used()
        .is_some_and(|used| used >= NVME_WEAR_LIMIT)
    {
        return STORAGE_WORN;
    }
    STORAGE_HEALTHY
}

pub fn score_battery(battery: &BatteryInfo) -> u8 {
    let Some(pct) = battery.health_pct.as_ref().and_then(value_to_int) else {
        return 80;
    };
    if pct >= 90 {
        95
    } else if pct >= 70 {
        80
    } else if pct >= 50 {
        60
    } else {
        30
    }
}

pub fn score_memory(memory: &MemoryInfo) -> u8 {
    if memory.errors.as_ref().is_some_and(is_truthy) {
        20
    } else {
        90
    }
}

pub fn score_cpu_thermal(_thermal: &ThermalInfo) -> u8 {
    85
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|v| v != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
