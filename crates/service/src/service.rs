use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use inspecta_core::{
    collect_identity, compose, detect_devices, sample_identity, scan_all, scan_sample,
    score_storage, CommandRunner, ComposeRequest, DeviceIdentity, Report, RunMode, RunStatus,
    ScanResult, StatusDetail, TestEntry,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::render::{render_outputs, OutputFormat};
use crate::sensors::{sample_thermal, write_sensors_csv};

pub const ARTIFACTS_DIR: &str = "artifacts";
pub const REPORT_FILE: &str = "report.json";
pub const LOG_FILE: &str = "agent.log";

const MEMTEST_PLACEHOLDER: &str = "Memtester placeholder\nOK\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub output: PathBuf,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub use_sample: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_profile() -> String {
    "default".to_string()
}

impl RunRequest {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            mode: RunMode::Quick,
            profile: default_profile(),
            use_sample: false,
            format: OutputFormat::default(),
        }
    }
}

/// Output directory layout for one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub output: PathBuf,
    pub artifacts: PathBuf,
    pub report: PathBuf,
    pub log_file: PathBuf,
}

impl RunPaths {
    pub fn new(output: &Path) -> Self {
        let artifacts = output.join(ARTIFACTS_DIR);
        Self {
            output: output.to_path_buf(),
            report: output.join(REPORT_FILE),
            log_file: artifacts.join(LOG_FILE),
            artifacts,
        }
    }

    /// Creates the output and artifacts directories.
    pub fn prepare(output: &Path) -> Result<Self> {
        let paths = Self::new(output);
        fs::create_dir_all(&paths.artifacts).with_context(|| {
            format!(
                "failed to create artifacts directory {}",
                paths.artifacts.display()
            )
        })?;
        Ok(paths)
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub report_path: PathBuf,
    pub smart_status: RunStatus,
    pub rendered: Vec<PathBuf>,
}

pub fn ensure_supported(mode: RunMode) -> Result<()> {
    if mode != RunMode::Quick {
        bail!("unsupported mode `{mode}`: only quick mode is implemented");
    }
    Ok(())
}

/// Runs a full inspection: inventory, SMART scan, placeholder artifacts,
/// composition, and rendering. Only an unsupported mode or a failure to
/// write the report aborts the run.
pub fn run_inspection(request: &RunRequest, runner: &dyn CommandRunner) -> Result<RunOutcome> {
    ensure_supported(request.mode)?;
    let paths = RunPaths::prepare(&request.output)?;

    info!(
        "starting inspection (mode={}, profile={}, sample={})",
        request.mode, request.profile, request.use_sample
    );

    info!("Step 1: detecting device inventory");
    let identity = inventory(request.use_sample, runner);

    info!("Step 2: scanning storage devices");
    let results = scan_storage(request.use_sample, runner);
    let smart_status = RunStatus::from_scan(&results, request.use_sample);
    let detail = if request.use_sample {
        StatusDetail::Sample
    } else {
        StatusDetail::Executed
    };
    let tests = record_scan_results(&paths, &results, detail)?;
    match smart_status {
        RunStatus::Missing => warn!("no storage devices found or SMART data unavailable"),
        RunStatus::Sample => info!("using sample SMART data (no real execution)"),
        RunStatus::Ok => info!("found {} storage device(s)", results.len()),
    }

    info!("Step 3: writing placeholder artifacts");
    write_placeholder_artifacts(&paths, request.use_sample)?;

    info!("Step 4: generating report");
    let artifacts = list_artifacts(&paths)?;
    let report = compose(ComposeRequest {
        agent_version: env!("CARGO_PKG_VERSION"),
        identity,
        artifacts,
        tests,
        mode: request.mode,
        profile: &request.profile,
        smart_status,
    });
    write_report(&report, &paths.report)?;
    info!("report written to {}", paths.report.display());
    info!(
        "overall score: {}/100 ({})",
        report.summary.overall_score, report.summary.grade
    );

    let rendered = render_outputs(&report, &paths.output, request.format)?;

    Ok(RunOutcome {
        report,
        report_path: paths.report,
        smart_status,
        rendered,
    })
}

/// Collects the device identity, falling back to a placeholder on failure.
pub fn inventory(use_sample: bool, runner: &dyn CommandRunner) -> DeviceIdentity {
    let collected = if use_sample {
        info!("using sample dmidecode output");
        sample_identity(None)
    } else {
        collect_identity(runner)
    };

    match collected {
        Ok(identity) => {
            info!(
                "device detected: {} {} (serial: {}, BIOS: {})",
                identity.vendor.as_deref().unwrap_or("unknown"),
                identity.model.as_deref().unwrap_or("unknown"),
                identity.serial.as_deref().unwrap_or("N/A"),
                identity.bios_version.as_deref().unwrap_or("N/A"),
            );
            identity
        }
        Err(err) => {
            warn!(
                kind = err.kind(),
                "inventory detection failed: {err}. Using placeholder."
            );
            DeviceIdentity::placeholder()
        }
    }
}

pub fn scan_storage(use_sample: bool, runner: &dyn CommandRunner) -> Vec<ScanResult> {
    if use_sample {
        return scan_sample().unwrap_or_else(|err| {
            error!("failed to load sample SMART data: {err}");
            Vec::new()
        });
    }

    let devices = match detect_devices() {
        Ok(devices) => devices,
        Err(err) => {
            error!("failed to detect storage devices: {err}");
            return Vec::new();
        }
    };
    if devices.is_empty() {
        warn!("no storage devices detected");
        return Vec::new();
    }
    for device in &devices {
        debug!("detected storage device: {device}");
    }
    scan_all(&devices, runner)
}

/// Writes raw SMART JSON per healthy device and converts every result into a
/// report test entry, preserving scan order.
fn record_scan_results(
    paths: &RunPaths,
    results: &[ScanResult],
    detail: StatusDetail,
) -> Result<Vec<TestEntry>> {
    let mut tests = Vec::with_capacity(results.len());
    for result in results {
        match result {
            ScanResult::Ok {
                device,
                data,
                raw_json,
                ..
            } => {
                let artifact = paths
                    .artifacts
                    .join(format!("smart_{}.json", result.short_name()));
                let payload = serde_json::to_string_pretty(raw_json)
                    .context("failed to serialize SMART output")?;
                fs::write(&artifact, payload)
                    .with_context(|| format!("failed to write {}", artifact.display()))?;
                info!(
                    "SMART OK: {} - {} (serial: {}, health score {})",
                    device,
                    data.model.as_deref().unwrap_or("unknown"),
                    data.serial.as_deref().unwrap_or("N/A"),
                    score_storage(data)
                );
            }
            ScanResult::Error { device, error } => {
                error!("SMART FAILED: {device} - {error}");
            }
        }
        tests.push(TestEntry::from_scan(result, detail));
    }
    Ok(tests)
}

fn write_placeholder_artifacts(paths: &RunPaths, use_sample: bool) -> Result<()> {
    let memtest = paths.artifacts.join("memtest.log");
    fs::write(&memtest, MEMTEST_PLACEHOLDER)
        .with_context(|| format!("failed to write {}", memtest.display()))?;

    let thermal = if use_sample { None } else { Some(sample_thermal()) };
    let sensors = paths.artifacts.join("sensors.csv");
    write_sensors_csv(&sensors, thermal.as_ref())
}

/// Files under the artifacts directory, relative to the output directory,
/// with `/` separators, sorted.
pub fn list_artifacts(paths: &RunPaths) -> Result<Vec<String>> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(&paths.artifacts).min_depth(1) {
        let entry = entry.with_context(|| {
            format!("failed to list artifacts in {}", paths.artifacts.display())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&paths.output)
            .unwrap_or(entry.path());
        let parts = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        artifacts.push(parts.join("/"));
    }
    artifacts.sort();
    Ok(artifacts)
}

pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let payload = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write report to {}", path.display()))
}

pub fn load_report(path: &Path) -> Result<Report> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    inspecta_core::load_report(&data)
        .with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use inspecta_core::{RunMode, RunStatus, SystemRunner, TestStatus};

    use super::{
        ensure_supported, list_artifacts, load_report, run_inspection, RunPaths, RunRequest,
    };
    use crate::render::OutputFormat;

    #[test]
    fn sample_run_writes_report_and_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut request = RunRequest::new(dir.path().join("out"));
        request.use_sample = true;
        request.format = OutputFormat::Txt;

        let outcome = run_inspection(&request, &SystemRunner).expect("sample run succeeds");

        assert_eq!(outcome.smart_status, RunStatus::Sample);
        assert!(outcome.report_path.exists());
        let report = &outcome.report;
        assert_eq!(report.device.vendor.as_deref(), Some("Dell Inc."));
        assert_eq!(report.tests.len(), 1);
        assert_eq!(report.tests[0].name, "smartctl_nvme0n1");
        assert_eq!(report.tests[0].status, TestStatus::Ok);
        assert_eq!(report.scores.storage, 80);
        assert_eq!(report.summary.overall_score, 83);
        assert_eq!(
            report.artifacts,
            vec![
                "artifacts/memtest.log",
                "artifacts/sensors.csv",
                "artifacts/smart_nvme0n1.json",
            ]
        );

        let reloaded = load_report(&outcome.report_path).expect("report reloads");
        assert_eq!(&reloaded, report);
        assert_eq!(outcome.rendered, vec![dir.path().join("out").join("report.txt")]);

        let sensors = fs::read_to_string(dir.path().join("out/artifacts/sensors.csv"))
            .expect("sensors written");
        assert_eq!(sensors, "timestamp,cpu_temp,fan_rpm\n");
    }

    #[test]
    fn full_mode_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut request = RunRequest::new(dir.path().join("out"));
        request.mode = RunMode::Full;
        assert!(ensure_supported(RunMode::Full).is_err());
        assert!(run_inspection(&request, &SystemRunner).is_err());
        assert!(!dir.path().join("out").join("report.json").exists());
    }

    #[test]
    fn artifacts_are_relative_and_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::prepare(dir.path()).expect("prepare");
        for name in ["sensors.csv", "agent.log", "smart_sda.json"] {
            fs::write(paths.artifacts.join(name), "x").expect("write");
        }
        let artifacts = list_artifacts(&paths).expect("list");
        assert_eq!(
            artifacts,
            vec![
                "artifacts/agent.log",
                "artifacts/sensors.csv",
                "artifacts/smart_sda.json",
            ]
        );
    }
}
