//! End-of-run summary data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every reachable node was exported.
    Complete,
    /// The scan limit stopped expansion early; output is a valid subset.
    LimitReached,
    /// A fatal transport or parse error stopped the traversal. Everything
    /// collected before the failure was still packaged.
    Aborted,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::LimitReached => "limit reached",
            RunStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub status: RunStatus,
    pub record_counts: Vec<(String, usize)>,
    pub link_count: usize,
    pub files: Vec<PathBuf>,
    pub archive: PathBuf,
    pub started: DateTime<Utc>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ScanReport {
    pub fn total_records(&self) -> usize {
        self.record_counts.iter().map(|(_, n)| n).sum()
    }
}

pub fn generate_text_summary(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Status: {}\n", report.status.label()));
    out.push_str(&format!(
        "  Started: {}\n",
        report.started.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "  Duration: {:.2}s\n",
        report.duration.as_secs_f64()
    ));

    out.push_str("\n# Records:\n");
    for (class, count) in &report.record_counts {
        out.push_str(&format!("  {:<40} {}\n", class, count));
    }
    out.push_str(&format!(
        "  {:<40} {}\n",
        "(total)",
        report.total_records()
    ));
    out.push_str(&format!("\n# Edges: {}\n", report.link_count));

    out.push_str("\n# Output:\n");
    for file in &report.files {
        out.push_str(&format!("  {}\n", file.display()));
    }
    out.push_str(&format!("  {}\n", report.archive.display()));

    if let Some(ref error) = report.error {
        out.push_str(&format!("\n[!] run aborted: {}\n", error));
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out
}
