//! Tool outputs bundled with the binary for `--use-sample` runs.

use serde_json::Value;

use crate::error::ToolError;

pub const SAMPLE_DEVICE: &str = "/dev/nvme0n1";

pub const DMIDECODE_SAMPLE: &str =
    include_str!("../../../samples/tool_outputs/dmidecode_sample.txt");
pub const SMART_NVME_SAMPLE: &str = include_str!("../../../samples/artifacts/smart_nvme0.json");
pub const SMART_SATA_HEALTHY_SAMPLE: &str =
    include_str!("../../../samples/tool_outputs/smartctl_sata_healthy.json");
pub const SMART_SATA_FAILING_SAMPLE: &str =
    include_str!("../../../samples/tool_outputs/smartctl_sata_failing.json");

pub fn smart_sample() -> Result<Value, ToolError> {
    serde_json::from_str(SMART_NVME_SAMPLE).map_err(|err| ToolError::ParseFailure {
        tool: "smartctl sample".to_string(),
        details: err.to_string(),
    })
}
