use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use inspecta_core::ThermalInfo;
use sysinfo::Components;

pub const SENSORS_HEADER: &str = "timestamp,cpu_temp,fan_rpm";

/// Reads CPU-related temperatures from the platform sensors.
pub fn sample_thermal() -> ThermalInfo {
    let components = Components::new_with_refreshed_list();
    let mut cpu_temps_c = Vec::new();
    for component in components.list() {
        let label = component.label().to_lowercase();
        let temperature = component.temperature();
        if !temperature.is_finite() || temperature <= 0.0 {
            continue;
        }
        if ["cpu", "core", "package", "tctl", "tdie"]
            .iter()
            .any(|needle| label.contains(needle))
        {
            cpu_temps_c.push(temperature);
        }
    }
    ThermalInfo { cpu_temps_c }
}

/// Writes `sensors.csv`. Sample runs pass `None` and get only the header;
/// live runs add one row with the hottest CPU reading. Fan speed is not
/// sampled and stays empty.
pub fn write_sensors_csv(path: &Path, thermal: Option<&ThermalInfo>) -> Result<()> {
    let mut csv = format!("{SENSORS_HEADER}\n");
    if let Some(thermal) = thermal {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let hottest = thermal
            .cpu_temps_c
            .iter()
            .copied()
            .fold(None, |max: Option<f32>, temp| {
                Some(max.map_or(temp, |max| max.max(temp)))
            });
        let cpu_temp = hottest.map(|temp| format!("{temp:.1}")).unwrap_or_default();
        let _ = writeln!(csv, "{timestamp},{cpu_temp},");
    }
    fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}
