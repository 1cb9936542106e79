use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::{load_report, REPORT_FILE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactCheck {
    pub path: String,
    pub exists: bool,
    pub bytes: Option<u64>,
    pub blake3: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleVerification {
    pub bundle: PathBuf,
    pub report_version: String,
    pub artifacts: Vec<ArtifactCheck>,
    pub signature_checked: bool,
}

impl BundleVerification {
    pub fn all_present(&self) -> bool {
        self.artifacts.iter().all(|artifact| artifact.exists)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ArtifactCheck> {
        self.artifacts.iter().filter(|artifact| !artifact.exists)
    }
}

/// Checks that every artifact listed in the bundle's `report.json` exists and
/// digests it. Signatures are not verified.
pub fn verify_bundle(bundle: &Path) -> Result<BundleVerification> {
    let report = load_report(&bundle.join(REPORT_FILE))?;
    let mut artifacts = Vec::with_capacity(report.artifacts.len());
    for relative in &report.artifacts {
        let path = bundle.join(relative);
        if !path.is_file() {
            artifacts.push(ArtifactCheck {
                path: relative.clone(),
                exists: false,
                bytes: None,
                blake3: None,
            });
            continue;
        }
        let (bytes, digest) = hash_file(&path)?;
        artifacts.push(ArtifactCheck {
            path: relative.clone(),
            exists: true,
            bytes: Some(bytes),
            blake3: Some(digest),
        });
    }

    Ok(BundleVerification {
        bundle: bundle.to_path_buf(),
        report_version: report.report_version,
        artifacts,
        signature_checked: false,
    })
}

fn hash_file(path: &Path) -> Result<(u64, String)> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0_u8; 64 * 1024];
    let mut total = 0_u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        total += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok((total, hasher.finalize().to_hex().to_string()))
}
