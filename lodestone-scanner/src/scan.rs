//! Run orchestration.
//!
//! The one place traversal, collection and packaging meet. Finalization is
//! unconditional: completed, limit-bounded and aborted traversals all
//! leave a well-formed archive behind, distinguished only by the report's
//! status.

use crate::error::Result;
use crate::walker::{ProgressCallback, SchemaStrategy, TreeWalker};
use chrono::Utc;
use lodestone_core::archive::ArchiveBuilder;
use lodestone_core::link::LinkCollector;
use lodestone_core::record::RecordCollector;
use lodestone_core::report::{RunStatus, ScanReport};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

pub struct ScanOptions {
    pub limit: usize,
    pub out_dir: PathBuf,
    pub archive_name: String,
    pub progress_callback: Option<ProgressCallback>,
}

impl ScanOptions {
    pub fn new(out_dir: impl Into<PathBuf>, archive_name: &str) -> Self {
        Self {
            limit: usize::MAX,
            out_dir: out_dir.into(),
            archive_name: archive_name.to_string(),
            progress_callback: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Execute one scan: walk the source, then package whatever was
/// collected. Returns an error only when packaging itself fails.
pub fn run<S: SchemaStrategy>(strategy: S, options: ScanOptions) -> Result<ScanReport> {
    let started = Utc::now();
    let clock = Instant::now();

    let mut records = RecordCollector::new(strategy.tables());
    let mut links = LinkCollector::new(strategy.link_policy());

    let mut walker = TreeWalker::new(strategy).with_limit(options.limit);
    if let Some(callback) = options.progress_callback {
        walker = walker.with_progress_callback(callback);
    }

    let walk_result = walker.walk(&mut records, &mut links);
    let (status, error) = match &walk_result {
        Ok(outcome) if outcome.limit_hit => (RunStatus::LimitReached, None),
        Ok(_) => (RunStatus::Complete, None),
        Err(e) => {
            error!("traversal aborted: {}", e);
            (RunStatus::Aborted, Some(e.to_string()))
        }
    };

    let manifest = ArchiveBuilder::new(&options.out_dir).finalize(
        &records,
        &links,
        &options.archive_name,
    )?;

    info!(
        "scan {}: {} records, {} edges, archive {}",
        status.label(),
        records.counts().iter().map(|(_, n)| n).sum::<usize>(),
        links.len(),
        manifest.archive.display()
    );

    Ok(ScanReport {
        status,
        record_counts: records.counts(),
        link_count: links.len(),
        files: manifest.files,
        archive: manifest.archive,
        started,
        duration: clock.elapsed(),
        error,
    })
}
