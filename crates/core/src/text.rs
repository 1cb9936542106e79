use serde_json::Value;

use crate::model::{Report, TestStatus};

const WIDTH: usize = 80;
const OK_SYMBOL: char = '✓';
const FAIL_SYMBOL: char = '✗';

/// Renders the fixed-layout plain text transcript of a report.
pub fn render_text_report(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::new();
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);

    lines.push(heavy.clone());
    lines.push("DEVICE INSPECTION REPORT".to_string());
    lines.push(heavy.clone());
    lines.push(String::new());

    lines.push(format!("Generated: {}", report.generated_at));
    lines.push(format!(
        "Agent: {} v{}",
        report.agent.name, report.agent.version
    ));
    lines.push(format!("Mode: {}", report.mode));
    lines.push(format!("Profile: {}", report.profile));
    lines.push(String::new());

    section(&mut lines, &light, "DEVICE INFORMATION");
    let device = &report.device;
    lines.push(format!("Vendor:       {}", or(&device.vendor, "Unknown")));
    lines.push(format!("Model:        {}", or(&device.model, "Unknown")));
    lines.push(format!("Serial:       {}", or(&device.serial, "N/A")));
    lines.push(format!("BIOS Version: {}", or(&device.bios_version, "N/A")));
    if let Some(sku) = &device.sku {
        lines.push(format!("SKU:          {sku}"));
    }
    lines.push(String::new());

    section(&mut lines, &light, "OVERALL ASSESSMENT");
    lines.push(format!(
        "Overall Score: {}/100",
        report.summary.overall_score
    ));
    lines.push(format!("Grade:         {}", report.summary.grade));
    lines.push(format!(
        "Recommendation: {}",
        report.summary.recommendation
    ));
    lines.push(String::new());

    section(&mut lines, &light, "COMPONENT SCORES");
    let mut scores = report.scores.entries();
    scores.sort_by(|a, b| a.0.cmp(b.0));
    for (category, score) in scores {
        lines.push(format!("{:<20} {:>3}/100", title_case(category), score));
    }
    lines.push(String::new());

    if !report.tests.is_empty() {
        section(&mut lines, &light, "TEST RESULTS");
        for test in &report.tests {
            let symbol = if test.status == TestStatus::Ok {
                OK_SYMBOL
            } else {
                FAIL_SYMBOL
            };
            let mut status = test.status.label().to_uppercase();
            if let Some(detail) = test.status_detail {
                status.push_str(&format!(" ({})", detail.label()));
            }
            lines.push(format!("{symbol} {:<40} {status}", test.name));

            if test.status == TestStatus::Ok {
                if let Some(data) = &test.data {
                    for (key, label) in [("model", "Model"), ("serial", "Serial")] {
                        if let Some(value) = data.get(key).and_then(display_value) {
                            lines.push(format!("  {label}: {value}"));
                        }
                    }
                }
            }
            if test.status == TestStatus::Error {
                if let Some(error) = &test.error {
                    lines.push(format!("  Error: {error}"));
                }
            }
        }
        lines.push(String::new());
    }

    if !report.artifacts.is_empty() {
        let mut artifacts = report.artifacts.clone();
        artifacts.sort();
        section(
            &mut lines,
            &light,
            &format!("ARTIFACTS ({} files)", artifacts.len()),
        );
        for artifact in artifacts {
            lines.push(format!("  - {artifact}"));
        }
        lines.push(String::new());
    }

    lines.push(heavy.clone());
    lines.push("END OF REPORT".to_string());
    lines.push(heavy);

    lines.join("\n")
}

fn section(lines: &mut Vec<String>, rule: &str, title: &str) {
    lines.push(rule.to_string());
    lines.push(title.to_string());
    lines.push(rule.to_string());
}

fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().unwrap_or(fallback)
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn title_case(category: &str) -> String {
    category
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_text_report;
    use crate::model::Report;

    fn sample_report() -> Report {
        serde_json::from_value(json!({
            "report_version": "1.0.0",
            "generated_at": "2025-10-30T12:00:00Z",
            "agent": {"name": "inspecta", "version": "0.1.0"},
            "device": {
                "vendor": "Test Vendor",
                "model": "Test Model",
                "serial": "TEST123",
                "bios_version": "1.0.0",
                "bios_date": null,
                "chassis_type": null,
                "sku": "TEST-SKU",
                "uuid": null,
                "family": null
            },
            "mode": "quick",
            "profile": "default",
            "summary": {"overall_score": 85, "grade": "Good", "recommendation": "Profile: default"},
            "scores": {"storage": 90, "battery": 80, "memory": 85, "cpu_thermal": 85},
            "tests": [
                {
                    "name": "smartctl_sda",
                    "status": "ok",
                    "data": {"model": "Test SSD", "serial": "SSD123"},
                    "status_detail": "executed"
                },
                {"name": "smartctl_sdb", "status": "error", "error": "Device not found"}
            ],
            "artifacts": ["artifacts/smart_sda.json", "artifacts/agent.log", "artifacts/memtest.log"],
            "evidence": {"manifest_sha256": null, "signed": false}
        }))
        .expect("fixture report deserializes")
    }

    #[test]
    fn renders_every_section_in_order() {
        let text = render_text_report(&sample_report());
        let order = [
            "DEVICE INSPECTION REPORT",
            "DEVICE INFORMATION",
            "OVERALL ASSESSMENT",
            "COMPONENT SCORES",
            "TEST RESULTS",
            "ARTIFACTS (3 files)",
            "END OF REPORT",
        ];
        let mut cursor = 0;
        for heading in order {
            let found = text[cursor..]
                .find(heading)
                .unwrap_or_else(|| panic!("{heading} missing or out of order"));
            cursor += found + heading.len();
        }
        assert!(text.contains("Test Vendor"));
        assert!(text.contains("TEST123"));
        assert!(text.contains("SKU:          TEST-SKU"));
        assert!(text.contains("Overall Score: 85/100"));
    }

    #[test]
    fn scores_are_sorted_and_title_cased() {
        let text = render_text_report(&sample_report());
        let battery = text.find("Battery").expect("battery row");
        let cpu = text.find("Cpu Thermal").expect("cpu row");
        let memory = text.find("Memory").expect("memory row");
        let storage = text.find("Storage").expect("storage row");
        assert!(battery < cpu && cpu < memory && memory < storage);
        assert!(text.contains(&format!("{:<20} {:>3}/100", "Storage", 90)));
    }

    #[test]
    fn test_lines_carry_symbol_padding_and_detail() {
        let text = render_text_report(&sample_report());
        assert!(text.contains(&format!("✓ {:<40} OK (executed)", "smartctl_sda")));
        assert!(text.contains(&format!("✗ {:<40} ERROR", "smartctl_sdb")));
        assert!(text.contains("  Model: Test SSD"));
        assert!(text.contains("  Serial: SSD123"));
        assert!(text.contains("  Error: Device not found"));
    }

    #[test]
    fn artifacts_are_listed_sorted() {
        let text = render_text_report(&sample_report());
        let log = text.find("  - artifacts/agent.log").expect("agent.log");
        let memtest = text.find("  - artifacts/memtest.log").expect("memtest.log");
        let smart = text.find("  - artifacts/smart_sda.json").expect("smart");
        assert!(log < memtest && memtest < smart);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut report = sample_report();
        report.tests.clear();
        report.artifacts.clear();
        report.device.serial = None;
        let text = render_text_report(&report);
        assert!(!text.contains("TEST RESULTS"));
        assert!(!text.contains("ARTIFACTS"));
        assert!(text.contains("Serial:       N/A"));
        assert!(text.ends_with(&format!("END OF REPORT\n{}", "=".repeat(80))));
    }
}
