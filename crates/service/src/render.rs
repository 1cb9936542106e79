use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use inspecta_core::{render_text_report, Report};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pdf::write_pdf;

pub const TEXT_REPORT_FILE: &str = "report.txt";
pub const PDF_REPORT_FILE: &str = "report.pdf";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Txt,
    Pdf,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn wants_text(self) -> bool {
        matches!(self, Self::Txt | Self::Both)
    }

    pub fn wants_pdf(self) -> bool {
        matches!(self, Self::Pdf | Self::Both)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Both => "both",
        })
    }
}

/// Renders the human-readable reports into `out_dir` and returns the files
/// written. Both formats carry the same transcript.
pub fn render_outputs(
    report: &Report,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let mut rendered = Vec::new();
    let transcript = render_text_report(report);
    if format.wants_text() {
        let path = out_dir.join(TEXT_REPORT_FILE);
        fs::write(&path, &transcript)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("text report written to {}", path.display());
        rendered.push(path);
    }
    if format.wants_pdf() {
        let path = out_dir.join(PDF_REPORT_FILE);
        write_pdf(&transcript, &path)?;
        info!("PDF report written to {}", path.display());
        rendered.push(path);
    }
    Ok(rendered)
}

/// Opens a file with the platform's default application. Returns whether the
/// opener reported success.
pub fn open_file(path: &Path) -> bool {
    let mut command = opener_command(path);
    match command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {
            debug!("opened {}", path.display());
            true
        }
        Ok(status) => {
            warn!("could not open {}: opener exited with {status}", path.display());
            false
        }
        Err(err) => {
            warn!("could not open {}: {err}", path.display());
            false
        }
    }
}

fn opener_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.arg("/C").arg("start").arg("").arg(path);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}
