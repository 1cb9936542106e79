use std::fs;
use std::path::Path;

use crate::error::ToolError;
use crate::exec::{CommandRunner, IDENTITY_TIMEOUT};
use crate::model::DeviceIdentity;
use crate::samples::DMIDECODE_SAMPLE;

const DMIDECODE: &str = "dmidecode";
const DMIDECODE_ARGS: &[&str] = &["-t", "system", "-t", "bios", "-t", "chassis"];

const PLACEHOLDERS: &[&str] = &["Not Specified", "To Be Filled By O.E.M.", ""];

#[derive(Debug, Clone, Copy)]
enum Field {
    Vendor,
    Model,
    Serial,
    Sku,
    Uuid,
    Family,
    BiosVersion,
    BiosDate,
    ChassisType,
}

struct FieldRule {
    section: &'static str,
    key: &'static str,
    field: Field,
    filter_placeholders: bool,
}

const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        section: "System Information",
        key: "Manufacturer",
        field: Field::Vendor,
        filter_placeholders: false,
    },
    FieldRule {
        section: "System Information",
        key: "Product Name",
        field: Field::Model,
        filter_placeholders: false,
    },
    FieldRule {
        section: "System Information",
        key: "Serial Number",
        field: Field::Serial,
        filter_placeholders: true,
    },
    FieldRule {
        section: "System Information",
        key: "SKU Number",
        field: Field::Sku,
        filter_placeholders: true,
    },
    FieldRule {
        section: "System Information",
        key: "UUID",
        field: Field::Uuid,
        filter_placeholders: false,
    },
    FieldRule {
        section: "System Information",
        key: "Family",
        field: Field::Family,
        filter_placeholders: true,
    },
    FieldRule {
        section: "BIOS Information",
        key: "Version",
        field: Field::BiosVersion,
        filter_placeholders: false,
    },
    FieldRule {
        section: "BIOS Information",
        key: "Release Date",
        field: Field::BiosDate,
        filter_placeholders: false,
    },
    FieldRule {
        section: "Chassis Information",
        key: "Type",
        field: Field::ChassisType,
        filter_placeholders: false,
    },
];

/// Parses `dmidecode` text into an identity record. Never fails; anything
/// that cannot be found is left as `None`.
pub fn parse_identity(raw: &str) -> DeviceIdentity {
    let mut identity = DeviceIdentity::default();
    for rule in FIELD_RULES {
        let Some(section) = find_section(raw, rule.section) else {
            continue;
        };
        let Some(value) = find_value(section, rule.key) else {
            continue;
        };
        if rule.filter_placeholders && PLACEHOLDERS.contains(&value) {
            continue;
        }
        *slot(&mut identity, rule.field) = Some(value.to_string());
    }
    identity
}

fn slot(identity: &mut DeviceIdentity, field: Field) -> &mut Option<String> {
    match field {
        Field::Vendor => &mut identity.vendor,
        Field::Model => &mut identity.model,
        Field::Serial => &mut identity.serial,
        Field::Sku => &mut identity.sku,
        Field::Uuid => &mut identity.uuid,
        Field::Family => &mut identity.family,
        Field::BiosVersion => &mut identity.bios_version,
        Field::BiosDate => &mut identity.bios_date,
        Field::ChassisType => &mut identity.chassis_type,
    }
}

/// Body of the first section titled `header`: everything after the header
/// up to a blank line followed by the next `Handle` record, or end of text.
fn find_section<'a>(raw: &'a str, header: &str) -> Option<&'a str> {
    let start = raw.find(header)? + header.len();
    let body = &raw[start..];
    let end = body.find("\n\nHandle").unwrap_or(body.len());
    Some(&body[..end])
}

/// First `key: value` line in `section`, matched on the trimmed key.
fn find_value<'a>(section: &'a str, key: &str) -> Option<&'a str> {
    section.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim() == key {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Runs `dmidecode` and parses its output.
pub fn collect_identity(runner: &dyn CommandRunner) -> Result<DeviceIdentity, ToolError> {
    let raw = execute_dmidecode(runner)?;
    Ok(parse_identity(&raw))
}

pub fn execute_dmidecode(runner: &dyn CommandRunner) -> Result<String, ToolError> {
    let output = runner.run(DMIDECODE, DMIDECODE_ARGS, IDENTITY_TIMEOUT)?;
    if output.exit_code == 0 {
        return Ok(output.stdout);
    }
    if output.stderr.contains("Permission denied") || output.exit_code == 1 {
        return Err(ToolError::PermissionDenied {
            operation: "reading DMI tables with dmidecode".to_string(),
            suggestion: "sudo inspecta inventory".to_string(),
        });
    }
    Err(ToolError::CommandFailed {
        tool: DMIDECODE.to_string(),
        details: output.stderr.trim().to_string(),
    })
}

/// Parses the bundled sample, or a caller-provided dump when `path` is set.
pub fn sample_identity(path: Option<&Path>) -> Result<DeviceIdentity, ToolError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|_| ToolError::SampleMissing(path.display().to_string()))?;
            Ok(parse_identity(&raw))
        }
        None => Ok(parse_identity(DMIDECODE_SAMPLE)),
    }
}
