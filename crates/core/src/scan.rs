use crate::error::ToolError;
use crate::exec::CommandRunner;
use crate::model::{DeviceKind, ScanResult};
use crate::samples::{smart_sample, SAMPLE_DEVICE};
use crate::smart::{execute_smartctl, parse_smart};

/// Queries every device in order. A failing device is recorded as an
/// `error` result and the batch moves on; nothing is retried.
pub fn scan_all(devices: &[String], runner: &dyn CommandRunner) -> Vec<ScanResult> {
    devices
        .iter()
        .map(|device| scan_device(device, runner))
        .collect()
}

pub fn scan_device(device: &str, runner: &dyn CommandRunner) -> ScanResult {
    match execute_smartctl(runner, device) {
        Ok(raw_json) => ok_result(device, raw_json),
        Err(err) => ScanResult::Error {
            device: device.to_string(),
            error: err.to_string(),
        },
    }
}

/// One successful result built from the bundled NVMe sample.
pub fn scan_sample() -> Result<Vec<ScanResult>, ToolError> {
    let raw_json = smart_sample()?;
    Ok(vec![ok_result(SAMPLE_DEVICE, raw_json)])
}

fn ok_result(device: &str, raw_json: serde_json::Value) -> ScanResult {
    let kind = DeviceKind::from_path(device);
    let mut data = parse_smart(&raw_json);
    data.device = Some(device.to_string());
    data.kind = kind;
    ScanResult::Ok {
        device: device.to_string(),
        kind,
        data,
        raw_json,
    }
}
