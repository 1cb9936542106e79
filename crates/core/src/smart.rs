use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::exec::{CommandRunner, SMART_TIMEOUT};
use crate::model::SmartRecord;

const SMARTCTL: &str = "smartctl";

/// Normalizes one `smartctl --json` document. Every field is read on its own,
/// so a missing or mistyped member only blanks that member; this never fails.
pub fn parse_smart(raw: &Value) -> SmartRecord {
    let mut record = SmartRecord::default();

    if let Some(device) = raw.get("device").and_then(Value::as_object) {
        record.name = text_field(device, "name");
        record.model = text_field(device, "model_name").or_else(|| text_field(device, "product"));
        record.serial = text_field(device, "serial_number");
    }

    let table = raw
        .get("ata_smart_attributes")
        .and_then(|ata| ata.get("table"))
        .and_then(Value::as_array);
    for entry in table.into_iter().flatten() {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let Some(name) = text_field(entry, "name") else {
            continue;
        };
        record.attributes.insert(name, attribute_value(entry));
    }

    if let Some(nvme) = raw
        .get("nvme_smart_health_information_log")
        .and_then(Value::as_object)
    {
        record.nvme_percentage_used = present(nvme, "percentage_used");
        record.nvme_critical_warning = present(nvme, "critical_warning");
    }

    record
}

/// Non-empty string member.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn present(object: &Map<String, Value>, key: &str) -> Option<Value> {
    object.get(key).filter(|value| !value.is_null()).cloned()
}

// A non-empty `raw` object carries the decoded count; otherwise the
// normalized `value` is used.
fn attribute_value(entry: &Map<String, Value>) -> Value {
    match entry.get("raw") {
        Some(Value::Object(raw)) if !raw.is_empty() => {
            raw.get("value").cloned().unwrap_or(Value::Null)
        }
        _ => entry.get("value").cloned().unwrap_or(Value::Null),
    }
}

/// Runs `smartctl --json -a` against one device and returns its JSON.
///
/// smartctl reports drive problems through bit flags in its exit status, so
/// only the fatal bits (command line, device open, crash) reject the output.
pub fn execute_smartctl(runner: &dyn CommandRunner, device: &str) -> Result<Value, ToolError> {
    let mut args = vec!["--json", "-a"];
    if device.contains("nvme") {
        args.extend(["-d", "nvme"]);
    }
    args.push(device);

    let output = runner.run(SMARTCTL, &args, SMART_TIMEOUT)?;
    match output.exit_code {
        1 => {
            return Err(ToolError::CommandFailed {
                tool: SMARTCTL.to_string(),
                details: format!("command line error for {device}: {}", output.stderr.trim()),
            })
        }
        2 => {
            return Err(ToolError::PermissionDenied {
                operation: format!(
                    "opening {device} (check the device exists): {}",
                    output.stderr.trim()
                ),
                suggestion: format!("sudo smartctl -a {device}"),
            })
        }
        code if code >= 128 || code < 0 => {
            return Err(ToolError::DeviceFailure {
                device: device.to_string(),
                reason: format!("smartctl crashed (exit {code}): {}", output.stderr.trim()),
            })
        }
        _ => {}
    }

    serde_json::from_str(&output.stdout).map_err(|err| ToolError::ParseFailure {
        tool: SMARTCTL.to_string(),
        details: format!("{device}: {err}"),
    })
}
