pub mod doctor;
pub mod pdf;
pub mod render;
pub mod sensors;
pub mod service;
pub mod verify;

pub use doctor::{doctor, DoctorInfo, ToolStatus};
pub use pdf::write_pdf;
pub use render::{open_file, render_outputs, OutputFormat, PDF_REPORT_FILE, TEXT_REPORT_FILE};
pub use service::{
    ensure_supported, inventory, list_artifacts, load_report, run_inspection, scan_storage,
    write_report, RunOutcome, RunPaths, RunRequest, ARTIFACTS_DIR, LOG_FILE, REPORT_FILE,
};
pub use verify::{verify_bundle, ArtifactCheck, BundleVerification};
