//! Draft-07 validation of serialized reports.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::error::ToolError;
use crate::model::Report;

/// The report schema shipped with this release.
pub const REPORT_SCHEMA: &str = include_str!("../../../schemas/report-schema-1.0.0.json");

const SCHEMA_TOOL: &str = "report schema";

pub fn report_schema() -> Result<Value, ToolError> {
    parse_schema(REPORT_SCHEMA)
}

pub fn parse_schema(text: &str) -> Result<Value, ToolError> {
    serde_json::from_str(text).map_err(|err| ToolError::ParseFailure {
        tool: SCHEMA_TOOL.to_string(),
        details: err.to_string(),
    })
}

/// Every violation of `schema` in `instance`, as `<path>: <message>` sorted
/// by path. An empty list means the instance is valid.
pub fn schema_errors(instance: &Value, schema: &Value) -> Result<Vec<String>, ToolError> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| ToolError::ParseFailure {
            tool: SCHEMA_TOOL.to_string(),
            details: err.to_string(),
        })?;

    let mut errors = match compiled.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                (path, error.to_string())
            })
            .collect::<Vec<_>>(),
    };
    errors.sort();
    Ok(errors
        .into_iter()
        .map(|(path, message)| format!("{path}: {message}"))
        .collect())
}

/// Validates a report against the bundled schema.
pub fn validate_report(report: &Report) -> Result<Vec<String>, ToolError> {
    let instance = serde_json::to_value(report).map_err(|err| ToolError::ParseFailure {
        tool: "report".to_string(),
        details: err.to_string(),
    })?;
    schema_errors(&instance, &report_schema()?)
}
