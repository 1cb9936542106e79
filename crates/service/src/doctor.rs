use std::env;
use std::time::Duration;

use inspecta_core::{detect_devices, CommandRunner};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::debug;

use crate::sensors::sample_thermal;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBED_TOOLS: [&str; 2] = ["dmidecode", "smartctl"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorInfo {
    pub os: String,
    pub arch: String,
    pub current_dir: Option<String>,
    pub tools: Vec<ToolStatus>,
    pub devices: Vec<String>,
    pub total_memory_bytes: u64,
    pub cpu_temps_c: Vec<f32>,
    pub notes: Vec<String>,
}

pub fn doctor(runner: &dyn CommandRunner) -> DoctorInfo {
    let current_dir = env::current_dir()
        .ok()
        .map(|path| path.to_string_lossy().to_string());
    let tools = PROBED_TOOLS
        .iter()
        .map(|tool| probe_tool(runner, tool))
        .collect::<Vec<_>>();

    let mut notes = vec![
        "Inspection is read-only; nothing on the inspected machine is modified.".to_string(),
        "Reports are not signed; evidence.signed is always false.".to_string(),
    ];
    let devices = match detect_devices() {
        Ok(devices) => devices,
        Err(err) => {
            notes.push(format!("Storage device listing failed: {err}"));
            Vec::new()
        }
    };
    if devices.is_empty() {
        notes.push(
            "No storage devices detected; use `run --use-sample` to exercise the pipeline."
                .to_string(),
        );
    }
    if tools.iter().any(|tool| !tool.available) {
        notes.push(
            "Missing tools degrade the matching report section instead of failing the run."
                .to_string(),
        );
    }

    let mut system = System::new();
    system.refresh_memory();

    DoctorInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        current_dir,
        tools,
        devices,
        total_memory_bytes: system.total_memory(),
        cpu_temps_c: sample_thermal().cpu_temps_c,
        notes,
    }
}

fn probe_tool(runner: &dyn CommandRunner, tool: &str) -> ToolStatus {
    let (available, detail) = match runner.run(tool, &["--version"], PROBE_TIMEOUT) {
        Ok(output) if output.exit_code == 0 => {
            let version = output.stdout.lines().next().unwrap_or("").trim().to_string();
            (true, version)
        }
        Ok(output) => (
            true,
            format!("present, but `--version` exited with {}", output.exit_code),
        ),
        Err(err) => (false, err.to_string()),
    };
    debug!("tool probe {tool}: available={available}");
    ToolStatus {
        name: tool.to_string(),
        available,
        detail,
    }
}
