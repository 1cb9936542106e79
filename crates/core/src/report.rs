use chrono::{DateTime, SecondsFormat, Utc};
use crate::model::{
    value_as_int, AgentInfo, DeviceIdentity, Evidence, Grade, Report, RunMode, RunStatus, Scores,
    Summary, TestEntry, TestStatus, AGENT_NAME, REPORT_VERSION,
};
use crate::scoring::{
    score_battery, score_cpu_thermal, score_memory, BatteryInfo, MemoryInfo, ThermalInfo,
};

const SMART_TEST_PREFIX: &str = "smartctl";

/// Everything the composer needs for one run.
#[derive(Debug, Clone)]
pub struct ComposeRequest<'a> {
    pub agent_version: &'a str,
    pub identity: DeviceIdentity,
    pub artifacts: Vec<String>,
    pub tests: Vec<TestEntry>,
    pub mode: RunMode,
    pub profile: &'a str,
    pub smart_status: RunStatus,
}

pub fn compose(request: ComposeRequest<'_>) -> Report {
    compose_at(request, Utc::now())
}

/// Composes the report with an explicit clock. Never fails: malformed test
/// data falls back to the documented defaults.
pub fn compose_at(request: ComposeRequest<'_>, now: DateTime<Utc>) -> Report {
    let scores = Scores {
        storage: storage_subscore(&request.tests),
        battery: score_battery(&BatteryInfo::default()),
        memory: score_memory(&MemoryInfo::default()),
        cpu_thermal: score_cpu_thermal(&ThermalInfo::default()),
    };
    let overall_score = scores.overall();

    Report {
        report_version: REPORT_VERSION.to_string(),
        generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        agent: AgentInfo {
            name: AGENT_NAME.to_string(),
            version: request.agent_version.to_string(),
        },
        device: request.identity,
        mode: request.mode,
        profile: request.profile.to_string(),
        summary: Summary {
            overall_score,
            grade: Grade::from_score(overall_score),
            recommendation: recommendation(request.profile, request.smart_status),
        },
        scores,
        tests: request.tests,
        artifacts: request.artifacts,
        evidence: Evidence::default(),
    }
}

/// Storage subscore from the SMART test entries.
///
/// Every `ok` smartctl entry overwrites the result of the ones before it, so
/// with several drives only the last one counts.
pub fn storage_subscore(tests: &[TestEntry]) -> u8 {
    let mut storage = 50;
    for test in tests {
        if !test.name.starts_with(SMART_TEST_PREFIX) || test.status != TestStatus::Ok {
            continue;
        }
        storage = 80;
        let reallocated = test
            .data
            .as_ref()
            .and_then(|data| data.get("attributes"))
            .and_then(|attributes| attributes.get("Reallocated_Sector_Ct"))
            .map(value_as_int)
            .unwrap_or(0);
        if reallocated > 10 {
            storage = 40;
        } else if reallocated > 0 {
            storage = 60;
        }
    }
    storage
}

fn recommendation(profile: &str, smart_status: RunStatus) -> String {
    let mut text = format!("Profile: {profile}");
    if smart_status == RunStatus::Missing {
        text.push_str(". No storage health data was collected.");
    }
    text
}

/// Parses `report.json` text back into a report.
pub fn load_report(text: &str) -> serde_json::Result<Report> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{compose_at, load_report, storage_subscore, ComposeRequest};
    use crate::model::{DeviceIdentity, Grade, RunMode, RunStatus, StatusDetail, TestEntry};
    use crate::schema::validate_report;

    fn smart_ok(name: &str, reallocated: Option<i64>) -> TestEntry {
        let attributes = match reallocated {
            Some(count) => json!({"Reallocated_Sector_Ct": count}),
            None => json!({}),
        };
        TestEntry::ok(
            name,
            json!({"model": "Disk", "attributes": attributes}),
            Some(StatusDetail::Executed),
        )
    }

    fn request(tests: Vec<TestEntry>, smart_status: RunStatus) -> ComposeRequest<'static> {
        ComposeRequest {
            agent_version: "0.1.0",
            identity: DeviceIdentity::placeholder(),
            artifacts: vec!["artifacts/agent.log".to_string()],
            tests,
            mode: RunMode::Quick,
            profile: "default",
            smart_status,
        }
    }

    #[test]
    fn failing_drive_scores_forty() {
        let report = compose_at(
            request(vec![smart_ok("smartctl_sdb", Some(248))], RunStatus::Ok),
            Utc::now(),
        );
        assert_eq!(report.scores.storage, 40);
    }

    #[test]
    fn ok_drive_without_reallocation_data_scores_eighty() {
        let report = compose_at(
            request(vec![smart_ok("smartctl_nvme0n1", None)], RunStatus::Sample),
            Utc::now(),
        );
        assert_eq!(report.scores.storage, 80);
        assert_eq!(report.summary.overall_score, 83);
        assert_eq!(report.summary.grade, Grade::Good);
        assert_eq!(report.summary.recommendation, "Profile: default");
    }

    #[test]
    fn no_tests_scores_fifty_and_notes_missing_data() {
        let report = compose_at(request(Vec::new(), RunStatus::Missing), Utc::now());
        assert_eq!(report.scores.storage, 50);
        // (50 + 80 + 90 + 85) / 4 = 76.25
        assert_eq!(report.summary.overall_score, 76);
        assert!(report
            .summary
            .recommendation
            .contains("No storage health data"));
    }

    #[test]
    fn small_reallocation_counts_score_sixty() {
        assert_eq!(storage_subscore(&[smart_ok("smartctl_sda", Some(1))]), 60);
        assert_eq!(storage_subscore(&[smart_ok("smartctl_sda", Some(10))]), 60);
        assert_eq!(storage_subscore(&[smart_ok("smartctl_sda", Some(11))]), 40);
        assert_eq!(storage_subscore(&[smart_ok("smartctl_sda", Some(0))]), 80);
    }

    #[test]
    fn errors_and_unrelated_tests_do_not_raise_storage() {
        let tests = vec![
            TestEntry::error("smartctl_sda", "Device error for /dev/sda: boom"),
            TestEntry::ok("memtest", json!({"attributes": {}}), None),
        ];
        assert_eq!(storage_subscore(&tests), 50);
    }

    // Multiple drives: the last ok entry wins even when an earlier drive is
    // failing. Pinned so any change to the aggregation is deliberate.
    #[test]
    fn last_smart_entry_wins() {
        let failing_first = vec![
            smart_ok("smartctl_sda", Some(248)),
            smart_ok("smartctl_sdb", Some(0)),
        ];
        assert_eq!(storage_subscore(&failing_first), 80);

        let failing_last = vec![
            smart_ok("smartctl_sda", Some(0)),
            smart_ok("smartctl_sdb", Some(248)),
        ];
        assert_eq!(storage_subscore(&failing_last), 40);
    }

    #[test]
    fn malformed_data_degrades_to_baseline() {
        let tests = vec![TestEntry::ok(
            "smartctl_sda",
            json!({"attributes": "not-a-map"}),
            None,
        )];
        assert_eq!(storage_subscore(&tests), 80);
    }

    #[test]
    fn timestamp_is_second_precision_utc() {
        let now = Utc
            .with_ymd_and_hms(2025, 10, 30, 12, 0, 0)
            .single()
            .expect("valid time");
        let report = compose_at(request(Vec::new(), RunStatus::Missing), now);
        assert_eq!(report.generated_at, "2025-10-30T12:00:00Z");
        assert_eq!(report.report_version, "1.0.0");
        assert_eq!(report.agent.name, "inspecta");
        assert_eq!(report.evidence.manifest_sha256, None);
        assert!(!report.evidence.signed);
    }

    #[test]
    fn composed_report_validates_against_schema() {
        let mut tests = vec![smart_ok("smartctl_sda", Some(0))];
        tests.push(TestEntry::error("smartctl_sdb", "Device error for /dev/sdb: boom"));
        let report = compose_at(request(tests, RunStatus::Ok), Utc::now());
        let errors = validate_report(&report).expect("schema compiles");
        assert!(errors.is_empty(), "{errors:?}");

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["mode"], json!("quick"));
        assert_eq!(value["summary"]["grade"], json!("Good"));
        assert_eq!(value["tests"][0]["status"], json!("ok"));
        assert_eq!(value["tests"][0]["status_detail"], json!("executed"));
        assert!(value["tests"][0].get("error").is_none());
        assert!(value["evidence"]["manifest_sha256"].is_null());
    }

    #[test]
    fn out_of_range_report_fails_schema_validation() {
        let mut report = compose_at(request(Vec::new(), RunStatus::Missing), Utc::now());
        report.summary.overall_score = 200;
        report.scores.storage = 255;
        report.report_version = "9.9.9".to_string();

        let errors = validate_report(&report).expect("schema compiles");

        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("/summary/overall_score: ")));
        assert!(errors.iter().any(|e| e.starts_with("/scores/storage: ")));
        assert!(errors.iter().any(|e| e.starts_with("/report_version: ")));

        let text = serde_json::to_string(&report).expect("serialize");
        assert_eq!(load_report(&text).expect("still loads"), report);
    }
}
