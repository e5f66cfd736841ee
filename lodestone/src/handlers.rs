//! Command handler logic, separated from argument plumbing so it can be
//! exercised without a terminal.

use lodestone_core::report::ScanReport;
use lodestone_scanner::arcgis::{ArcGisStrategy, ARCHIVE_NAME};
use lodestone_scanner::openapi::OpenApiStrategy;
use lodestone_scanner::scan::{run, ScanOptions};
use lodestone_scanner::walker::ProgressCallback;
use std::path::{Path, PathBuf};

/// Expand `~` in the output directory argument.
pub fn expand_out_dir(out: &str) -> PathBuf {
    let expanded = shellexpand::tilde(out);
    Path::new(expanded.as_ref()).to_path_buf()
}

/// The bundle is named after the document it came from.
pub fn archive_name_for(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("openapi")
        .to_string()
}

pub fn run_arcgis_scan(
    url: &str,
    limit: usize,
    out_dir: PathBuf,
    allowed: Vec<String>,
    progress: Option<ProgressCallback>,
) -> anyhow::Result<ScanReport> {
    let strategy = ArcGisStrategy::new(url)?.with_allowed_kinds(allowed);
    let mut options = ScanOptions::new(out_dir, ARCHIVE_NAME).with_limit(limit);
    if let Some(progress) = progress {
        options = options.with_progress_callback(progress);
    }
    Ok(run(strategy, options)?)
}

pub fn run_openapi_scan(
    file: &Path,
    limit: usize,
    out_dir: PathBuf,
    progress: Option<ProgressCallback>,
) -> anyhow::Result<ScanReport> {
    let archive_name = archive_name_for(file);
    let mut options = ScanOptions::new(out_dir, &archive_name).with_limit(limit);
    if let Some(progress) = progress {
        options = options.with_progress_callback(progress);
    }
    Ok(run(OpenApiStrategy::from_file(file), options)?)
}
