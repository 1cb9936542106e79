use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const REPORT_VERSION: &str = "1.0.0";
pub const AGENT_NAME: &str = "inspecta";

/// Static hardware identification gathered from `dmidecode`.
///
/// Every field is always serialized; unknown values are `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub bios_version: Option<String>,
    pub bios_date: Option<String>,
    pub chassis_type: Option<String>,
    pub sku: Option<String>,
    pub uuid: Option<String>,
    pub family: Option<String>,
}

impl DeviceIdentity {
    /// Identity used when collection fails and the run continues anyway.
    pub fn placeholder() -> Self {
        Self {
            vendor: Some("unknown".to_string()),
            model: Some("unknown".to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Sata,
    Nvme,
    #[default]
    Unknown,
}

impl DeviceKind {
    pub fn from_path(device: &str) -> Self {
        if device.contains("nvme") {
            DeviceKind::Nvme
        } else {
            DeviceKind::Sata
        }
    }
}

/// Normalized SMART snapshot for one storage device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SmartRecord {
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub nvme_percentage_used: Option<Value>,
    #[serde(default)]
    pub nvme_critical_warning: Option<Value>,
}

impl SmartRecord {
    /// Integer view of an attribute. Missing or non-numeric values read as 0.
    pub fn attribute_int(&self, name: &str) -> i64 {
        self.attributes.get(name).map(value_as_int).unwrap_or(0)
    }

    pub fn percentage_used(&self) -> Option<i64> {
        self.nvme_percentage_used
            .as_ref()
            .filter(|value| !value.is_null())
            .and_then(value_to_int)
    }

    pub fn has_health_data(&self) -> bool {
        !self.attributes.is_empty()
            || self
                .nvme_percentage_used
                .as_ref()
                .is_some_and(|value| !value.is_null())
    }
}

pub(crate) fn value_as_int(value: &Value) -> i64 {
    value_to_int(value).unwrap_or(0)
}

pub(crate) fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|v| v.min(i64::MAX as u64) as i64))
            .or_else(|| number.as_f64().map(|v| v as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

/// Outcome of querying one storage device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResult {
    Ok {
        device: String,
        kind: DeviceKind,
        data: SmartRecord,
        raw_json: Value,
    },
    Error {
        device: String,
        error: String,
    },
}

impl ScanResult {
    pub fn device(&self) -> &str {
        match self {
            ScanResult::Ok { device, .. } | ScanResult::Error { device, .. } => device,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            ScanResult::Ok { kind, .. } => *kind,
            ScanResult::Error { .. } => DeviceKind::Unknown,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ScanResult::Ok { .. })
    }

    /// Short device name used for artifact and test names (`/dev/sda` -> `sda`).
    pub fn short_name(&self) -> &str {
        short_device_name(self.device())
    }
}

pub fn short_device_name(device: &str) -> &str {
    device.strip_prefix("/dev/").unwrap_or(device)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Ok,
    Warn,
    Error,
    Fail,
}

impl TestStatus {
    pub fn label(self) -> &'static str {
        match self {
            TestStatus::Ok => "ok",
            TestStatus::Warn => "warn",
            TestStatus::Error => "error",
            TestStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusDetail {
    Sample,
    Executed,
}

impl StatusDetail {
    pub fn label(self) -> &'static str {
        match self {
            StatusDetail::Sample => "sample",
            StatusDetail::Executed => "executed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestEntry {
    pub name: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<StatusDetail>,
}

impl TestEntry {
    pub fn ok(name: impl Into<String>, data: Value, detail: Option<StatusDetail>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Ok,
            data: Some(data),
            error: None,
            status_detail: detail,
        }
    }

    pub fn error(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Error,
            data: None,
            error: Some(error.into()),
            status_detail: None,
        }
    }

    /// Builds the `smartctl_<device>` entry for one scan outcome.
    pub fn from_scan(result: &ScanResult, detail: StatusDetail) -> Self {
        let name = format!("smartctl_{}", result.short_name());
        match result {
            ScanResult::Ok { data, .. } => {
                let data = serde_json::to_value(data).unwrap_or(Value::Null);
                Self::ok(name, data, Some(detail))
            }
            ScanResult::Error { error, .. } => Self::error(name, error.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Quick,
    Full,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Quick => f.write_str("quick"),
            RunMode::Full => f.write_str("full"),
        }
    }
}

/// Overall outcome of the SMART collection step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Missing,
    Sample,
}

impl RunStatus {
    pub fn from_scan(results: &[ScanResult], use_sample: bool) -> Self {
        if results.is_empty() {
            RunStatus::Missing
        } else if use_sample {
            RunStatus::Sample
        } else {
            RunStatus::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        if score >= 90 {
            Grade::Excellent
        } else if score >= 75 {
            Grade::Good
        } else if score >= 50 {
            Grade::Fair
        } else {
            Grade::Poor
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Fair => "Fair",
            Grade::Poor => "Poor",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub overall_score: u8,
    pub grade: Grade,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub storage: u8,
    pub battery: u8,
    pub memory: u8,
    pub cpu_thermal: u8,
}

impl Scores {
    pub const CATEGORY_COUNT: u32 = 4;

    pub fn entries(&self) -> [(&'static str, u8); 4] {
        [
            ("storage", self.storage),
            ("battery", self.battery),
            ("memory", self.memory),
            ("cpu_thermal", self.cpu_thermal),
        ]
    }

    /// Truncated mean over all categories.
    pub fn overall(&self) -> u8 {
        let total: u32 = self
            .entries()
            .iter()
            .map(|(_, score)| u32::from(*score))
            .sum();
        (total / Self::CATEGORY_COUNT) as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Evidence {
    pub manifest_sha256: Option<String>,
    pub signed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub report_version: String,
    pub generated_at: String,
    pub agent: AgentInfo,
    pub device: DeviceIdentity,
    pub mode: RunMode,
    pub profile: String,
    pub summary: Summary,
    pub scores: Scores,
    pub tests: Vec<TestEntry>,
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub evidence: Evidence,
}
