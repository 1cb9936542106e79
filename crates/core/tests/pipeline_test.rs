use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use inspecta_core::{
    compose_at, detect_devices_in, parse_identity, scan_all, score_storage, CommandOutput,
    CommandRunner, ComposeRequest, Grade, RunMode, RunStatus, ScanResult, StatusDetail,
    TestEntry, TestStatus, ToolError,
};

fn sample(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop();
    path.pop();
    path.push("samples/tool_outputs");
    path.push(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
}

/// Serves bundled smartctl documents per device; anything else is denied.
struct FixtureRunner;

impl CommandRunner for FixtureRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<CommandOutput, ToolError> {
        assert_eq!(program, "smartctl");
        let device = args.last().copied().unwrap_or_default();
        let (exit_code, stdout) = match device {
            "/dev/sda" => (0, sample("smartctl_sata_healthy.json")),
            // Bit 3: disk failing. Output is still parsed.
            "/dev/sdb" => (8, sample("smartctl_sata_failing.json")),
            _ => (2, String::new()),
        };
        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr: if exit_code == 2 {
                "Permission denied".to_string()
            } else {
                String::new()
            },
        })
    }
}

fn fake_sys_block(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in names {
        fs::create_dir(dir.path().join(name)).expect("device entry");
    }
    dir
}

fn tests_from(results: &[ScanResult]) -> Vec<TestEntry> {
    results
        .iter()
        .map(|result| TestEntry::from_scan(result, StatusDetail::Executed))
        .collect()
}

fn request(tests: Vec<TestEntry>, smart_status: RunStatus) -> ComposeRequest<'static> {
    ComposeRequest {
        agent_version: "0.1.0",
        identity: parse_identity(&sample("dmidecode_sample.txt")),
        artifacts: Vec::new(),
        tests,
        mode: RunMode::Quick,
        profile: "Office",
        smart_status,
    }
}

#[test]
fn detected_drives_flow_into_a_scored_report() {
    let sys_block = fake_sys_block(&["sda", "sdb", "loop0", "ram0", "dm-0", "nvme0"]);
    let devices = detect_devices_in(sys_block.path()).expect("listing");
    assert_eq!(devices, vec!["/dev/sda", "/dev/sdb"]);

    let results = scan_all(&devices, &FixtureRunner);
    assert!(results.iter().all(ScanResult::is_ok));

    let records = results
        .iter()
        .filter_map(|result| match result {
            ScanResult::Ok { data, .. } => Some(data),
            ScanResult::Error { .. } => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(score_storage(records[0]), 90);
    assert_eq!(score_storage(records[1]), 30);

    let now = Utc
        .with_ymd_and_hms(2025, 10, 30, 12, 0, 0)
        .single()
        .expect("valid time");
    let report = compose_at(
        request(tests_from(&results), RunStatus::from_scan(&results, false)),
        now,
    );

    // The failing drive is scanned last, so its reallocation count decides.
    assert_eq!(report.scores.storage, 40);
    // (40 + 80 + 90 + 85) / 4 = 73.75
    assert_eq!(report.summary.overall_score, 73);
    assert_eq!(report.summary.grade, Grade::Fair);
    assert_eq!(report.summary.recommendation, "Profile: Office");
    assert_eq!(report.device.vendor.as_deref(), Some("Dell Inc."));
    assert_eq!(report.tests[1].name, "smartctl_sdb");
}

#[test]
fn denied_device_is_recorded_and_the_batch_continues() {
    let devices = vec!["/dev/sda".to_string(), "/dev/sdc".to_string()];
    let results = scan_all(&devices, &FixtureRunner);
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(!results[1].is_ok());

    let tests = tests_from(&results);
    assert_eq!(tests[1].status, TestStatus::Error);
    assert!(tests[1]
        .error
        .as_deref()
        .is_some_and(|error| error.contains("Permission denied")));

    let report = compose_at(request(tests, RunStatus::Ok), Utc::now());
    assert_eq!(report.scores.storage, 80);
}

#[test]
fn empty_listing_yields_missing_status_and_baseline_storage() {
    let sys_block = fake_sys_block(&["loop0", "zram0"]);
    let devices = detect_devices_in(sys_block.path()).expect("listing");
    assert!(devices.is_empty());

    let results = scan_all(&devices, &FixtureRunner);
    let status = RunStatus::from_scan(&results, false);
    assert_eq!(status, RunStatus::Missing);

    let report = compose_at(request(Vec::new(), status), Utc::now());
    assert_eq!(report.scores.storage, 50);
    assert_eq!(
        report.summary.recommendation,
        "Profile: Office. No storage health data was collected."
    );
}
