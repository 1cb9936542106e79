mod exit;
mod logging;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inspecta_core::{
    collect_identity, parse_schema, report_schema, sample_identity, schema_errors, RunMode,
    RunStatus, SystemRunner,
};
use inspecta_service::{
    doctor, ensure_supported, open_file, run_inspection, verify_bundle, OutputFormat, RunPaths,
    RunRequest,
};
use tracing::{error, info, warn};

use crate::exit::{fatal_err, inventory_failed_err, verify_failed_err, ExitCode};
use crate::logging::{init_logging, LogConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "inspecta",
    version,
    about = "Local device inspection: hardware identity, storage health, scored report."
)]
struct Cli {
    /// Console log layout.
    #[arg(long, global = true, value_enum, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect and print device hardware identity as JSON.
    Inventory(InventoryArgs),
    /// Run an inspection and write report.json plus artifacts.
    Run(RunArgs),
    /// Show environment, tool availability, and detected storage devices.
    Doctor,
    /// Check that every artifact listed in a bundle's report exists.
    Verify(VerifyArgs),
    /// Validate a report.json against the report JSON Schema (draft-07).
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct InventoryArgs {
    /// Use bundled sample output instead of executing dmidecode.
    #[arg(long)]
    use_sample: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliMode {
    Quick,
    Full,
}

impl From<CliMode> for RunMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Quick => RunMode::Quick,
            CliMode::Full => RunMode::Full,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliFormat {
    Txt,
    Pdf,
    Both,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Txt => OutputFormat::Txt,
            CliFormat::Pdf => OutputFormat::Pdf,
            CliFormat::Both => OutputFormat::Both,
        }
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Inspection mode. Only `quick` is implemented.
    #[arg(long, default_value = "quick")]
    mode: CliMode,

    /// Output directory for report.json and artifacts/.
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Buyer profile recorded in the report (Office, Gamer, ...).
    #[arg(long, default_value = "default")]
    profile: String,

    /// Don't prompt for consent (for CI). Runs never prompt; accepted for compatibility.
    #[arg(long)]
    no_prompt: bool,

    /// Use bundled sample data (no root required).
    #[arg(long)]
    use_sample: bool,

    /// Enable debug logging on the console.
    #[arg(short, long)]
    verbose: bool,

    /// Human-readable report format.
    #[arg(long, default_value = "both")]
    format: CliFormat,

    /// Open the rendered report when the run finishes.
    #[arg(long, overrides_with = "no_auto_open")]
    auto_open: bool,

    /// Never open the rendered report.
    #[arg(long, overrides_with = "auto_open")]
    no_auto_open: bool,
}

#[derive(Debug, Args)]
struct VerifyArgs {
    /// Bundle directory containing report.json and artifacts/.
    #[arg(value_name = "DIR")]
    bundle: PathBuf,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Report file to check.
    #[arg(value_name = "REPORT")]
    report: PathBuf,

    /// Schema to check against instead of the bundled one.
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit::exit_code(&err));
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let logs = LogConfig::default().with_format(cli.log_format);
    match cli.command {
        Commands::Inventory(args) => run_inventory_command(args, logs),
        Commands::Run(args) => run_run_command(args, logs),
        Commands::Doctor => run_doctor_command(logs),
        Commands::Verify(args) => run_verify_command(args, logs),
        Commands::Validate(args) => run_validate_command(args, logs),
    }
}

fn run_inventory_command(args: InventoryArgs, logs: LogConfig) -> Result<ExitCode> {
    let _ = init_logging(&logs);
    let identity = if args.use_sample {
        sample_identity(None)
    } else {
        collect_identity(&SystemRunner)
    };
    let identity = identity.map_err(|err| {
        error!("inventory detection failed: {err}");
        inventory_failed_err(anyhow::Error::new(err))
    })?;
    let payload =
        serde_json::to_string_pretty(&identity).context("failed to serialize inventory")?;
    println!("{payload}");
    Ok(ExitCode::Success)
}

fn run_run_command(args: RunArgs, logs: LogConfig) -> Result<ExitCode> {
    let RunArgs {
        mode,
        output,
        profile,
        no_prompt,
        use_sample,
        verbose,
        format,
        auto_open,
        no_auto_open,
    } = args;

    let paths = RunPaths::prepare(&output).map_err(fatal_err)?;
    let logs = LogConfig::console(verbose)
        .with_format(logs.format)
        .with_file(&paths.log_file);
    init_logging(&logs).map_err(fatal_err)?;

    let mode = RunMode::from(mode);
    info!("{}", "=".repeat(60));
    info!("INSPECTA AGENT v{}", env!("CARGO_PKG_VERSION"));
    info!("Mode: {mode} | Profile: {profile} | Sample: {use_sample}");
    info!("{}", "=".repeat(60));
    if no_prompt {
        info!("--no-prompt acknowledged; runs never prompt.");
    }

    if let Err(err) = ensure_supported(mode) {
        error!("unsupported mode: {mode}");
        return Err(fatal_err(err));
    }

    let request = RunRequest {
        output,
        mode,
        profile,
        use_sample,
        format: format.into(),
    };
    let outcome = run_inspection(&request, &SystemRunner).map_err(fatal_err)?;

    info!("{}", "=".repeat(60));
    info!("inspection complete. Log file: {}", paths.log_file.display());
    info!("{}", "=".repeat(60));
    println!("Report written to {}", outcome.report_path.display());
    println!(
        "Overall score: {}/100 ({})",
        outcome.report.summary.overall_score, outcome.report.summary.grade
    );

    if auto_open && !no_auto_open {
        if let Some(first) = outcome.rendered.first() {
            open_file(first);
        }
    }

    if outcome.smart_status == RunStatus::Sample {
        warn!("quick run used sample artifacts; reporting partial success");
        return Ok(ExitCode::Partial);
    }
    Ok(ExitCode::Success)
}

fn run_doctor_command(logs: LogConfig) -> Result<ExitCode> {
    let _ = init_logging(&logs);
    let info = doctor(&SystemRunner);
    println!("OS: {} ({})", info.os, info.arch);
    if let Some(current_dir) = info.current_dir {
        println!("Current directory: {current_dir}");
    }
    println!("Total memory: {}", human_bytes(info.total_memory_bytes));
    if info.cpu_temps_c.is_empty() {
        println!("CPU temperatures: unavailable");
    } else {
        let temps = info
            .cpu_temps_c
            .iter()
            .map(|temp| format!("{temp:.1}°C"))
            .collect::<Vec<_>>();
        println!("CPU temperatures: {}", temps.join(", "));
    }
    println!("Tools:");
    for tool in &info.tools {
        println!(
            "- {} [{}] {}",
            tool.name,
            if tool.available { "ok" } else { "missing" },
            tool.detail
        );
    }
    println!("Storage devices:");
    if info.devices.is_empty() {
        println!("- none detected");
    }
    for device in &info.devices {
        println!("- {device}");
    }
    println!("Notes:");
    for note in &info.notes {
        println!("- {note}");
    }
    Ok(ExitCode::Success)
}

fn run_verify_command(args: VerifyArgs, logs: LogConfig) -> Result<ExitCode> {
    let _ = init_logging(&logs);
    let verification = verify_bundle(&args.bundle).map_err(verify_failed_err)?;
    println!("Bundle: {}", verification.bundle.display());
    println!("Report version: {}", verification.report_version);
    for artifact in &verification.artifacts {
        match &artifact.blake3 {
            Some(digest) => println!("- {} blake3:{digest}", artifact.path),
            None => println!("- {} MISSING", artifact.path),
        }
    }
    println!("No signature verification performed; bundles are not signed.");

    if verification.all_present() {
        Ok(ExitCode::Success)
    } else {
        let missing = verification.missing().count();
        eprintln!("{missing} listed artifact(s) missing");
        Ok(ExitCode::VerifyFailed)
    }
}

/// Exit 0 when the report conforms, 3 when it does not parse or violates the
/// schema. Unreadable files and a broken schema are fatal.
fn run_validate_command(args: ValidateArgs, logs: LogConfig) -> Result<ExitCode> {
    let _ = init_logging(&logs);
    let schema = match &args.schema {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read schema {}", path.display()))
                .map_err(fatal_err)?;
            parse_schema(&text)
        }
        None => report_schema(),
    }
    .map_err(|err| fatal_err(err.into()))?;

    let text = fs::read_to_string(&args.report)
        .with_context(|| format!("failed to read {}", args.report.display()))
        .map_err(fatal_err)?;
    let instance = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(instance) => instance,
        Err(err) => {
            println!("Validation error: not valid JSON: {err}");
            return Ok(ExitCode::Invalid);
        }
    };

    let errors = schema_errors(&instance, &schema).map_err(|err| fatal_err(err.into()))?;
    if errors.is_empty() {
        println!("OK: {} validates against schema", args.report.display());
        return Ok(ExitCode::Success);
    }
    for error in &errors {
        println!("Validation error: {error}");
    }
    warn!("{} schema violation(s) in {}", errors.len(), args.report.display());
    Ok(ExitCode::Invalid)
}

fn human_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if value == 0 {
        return "0 B".to_string();
    }
    let mut size = value as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};
    use crate::logging::LogFormat;

    #[test]
    fn log_format_is_global() {
        let cli =
            Cli::try_parse_from(["inspecta", "doctor", "--log-format", "full"]).expect("parse");
        assert_eq!(cli.log_format, LogFormat::Full);
        let cli = Cli::try_parse_from(["inspecta", "doctor"]).expect("parse");
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert!(Cli::try_parse_from(["inspecta", "--log-format", "json", "doctor"]).is_err());
    }

    #[test]
    fn validate_takes_a_report_and_optional_schema() {
        let cli = Cli::try_parse_from(["inspecta", "validate", "out/report.json"]).expect("parse");
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.report.to_str(), Some("out/report.json"));
                assert!(args.schema.is_none());
            }
            other => panic!("expected validate, got {other:?}"),
        }
    }
}
