pub mod device;
pub mod error;
pub mod exec;
pub mod inventory;
pub mod model;
pub mod report;
pub mod samples;
pub mod scan;
pub mod schema;
pub mod scoring;
pub mod smart;
pub mod text;

pub use device::{detect_devices, detect_devices_in, DeviceFilter, SYS_BLOCK};
pub use error::ToolError;
pub use exec::{
    CommandOutput, CommandRunner, SystemRunner, IDENTITY_TIMEOUT, SMART_TIMEOUT,
};
pub use inventory::{collect_identity, parse_identity, sample_identity};
pub use model::{
    short_device_name, AgentInfo, DeviceIdentity, DeviceKind, Evidence, Grade, Report, RunMode,
    RunStatus, ScanResult, Scores, SmartRecord, StatusDetail, Summary, TestEntry, TestStatus,
    AGENT_NAME, REPORT_VERSION,
};
pub use report::{compose, compose_at, load_report, ComposeRequest};
pub use scan::{scan_all, scan_device, scan_sample};
pub use schema::{
    parse_schema, report_schema, schema_errors, validate_report, REPORT_SCHEMA,
};
pub use scoring::{
    score_battery, score_cpu_thermal, score_memory, score_storage, BatteryInfo, MemoryInfo,
    ThermalInfo,
};
pub use smart::{execute_smartctl, parse_smart};
pub use text::render_text_report;
