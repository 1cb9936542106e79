use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::ToolError;

pub const SYS_BLOCK: &str = "/sys/block";

const EXCLUDED: &[&str] = &["loop*", "ram*", "dm-*", "sr*"];
const INCLUDED: &[&str] = &["sd*", "nvme*", "hd*", "vd*"];
const NVME_NAMESPACE: &str = r"^nvme\d+n\d+$";

/// Include/exclude rules for kernel block device names.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    excluded: GlobSet,
    included: GlobSet,
    nvme_namespace: Regex,
}

impl DeviceFilter {
    pub fn standard() -> Result<Self, ToolError> {
        Ok(Self {
            excluded: build_globset(EXCLUDED)?,
            included: build_globset(INCLUDED)?,
            nvme_namespace: Regex::new(NVME_NAMESPACE)
                .map_err(|err| ToolError::Pattern(err.to_string()))?,
        })
    }

    /// Whether `name` (as listed under `/sys/block`) is a storage device
    /// worth querying. NVMe controllers (`nvme0`) are rejected in favor of
    /// their namespaces (`nvme0n1`).
    pub fn accepts(&self, name: &str) -> bool {
        if self.excluded.is_match(name) || !self.included.is_match(name) {
            return false;
        }
        if name.starts_with("nvme") {
            return self.nvme_namespace.is_match(name);
        }
        true
    }
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet, ToolError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| ToolError::Pattern(err.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ToolError::Pattern(err.to_string()))
}

/// Storage devices listed under `/sys/block`, as sorted `/dev/<name>` paths.
pub fn detect_devices() -> Result<Vec<String>, ToolError> {
    detect_devices_in(Path::new(SYS_BLOCK))
}

/// Same as [`detect_devices`] against an arbitrary listing directory. A
/// missing directory yields no devices.
pub fn detect_devices_in(listing: &Path) -> Result<Vec<String>, ToolError> {
    if !listing.exists() {
        return Ok(Vec::new());
    }

    let filter = DeviceFilter::standard()?;
    let mut devices = Vec::new();
    for entry in WalkDir::new(listing).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| ToolError::Listing {
            path: listing.display().to_string(),
            source: err.into(),
        })?;
        let name = entry.file_name().to_string_lossy();
        if filter.accepts(&name) {
            devices.push(format!("/dev/{name}"));
        }
    }
    devices.sort();
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{detect_devices_in, DeviceFilter};

    #[test]
    fn filter_accepts_only_storage_names() {
        let filter = DeviceFilter::standard().expect("patterns compile");
        for name in ["sda", "sdb", "hda", "vda", "nvme0n1", "nvme12n3"] {
            assert!(filter.accepts(name), "{name} should be accepted");
        }
        for name in [
            "loop0", "ram0", "dm-0", "sr0", "nvme0", "nvme0c0n1", "zram0", "md0", "mmcblk0",
        ] {
            assert!(!filter.accepts(name), "{name} should be rejected");
        }
    }

    #[test]
    fn detects_sorted_devices_from_listing() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["sdb", "loop0", "nvme0n1", "ram0", "dm-0", "sr0", "nvme0", "sda"] {
            fs::create_dir(dir.path().join(name)).expect("create entry");
        }

        let devices = detect_devices_in(dir.path()).expect("listing readable");
        assert_eq!(devices, vec!["/dev/nvme0n1", "/dev/sda", "/dev/sdb"]);
    }

    #[test]
    fn missing_listing_yields_no_devices() {
        let dir = tempfile::tempdir().expect("tempdir");
        let devices = detect_devices_in(&dir.path().join("absent")).expect("no error");
        assert!(devices.is_empty());
    }
}
