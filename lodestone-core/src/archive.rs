//! Flat-file serialization and bundling.
//!
//! At finalize time every record bucket becomes one CSV file named after
//! its class, the edge table becomes `links.csv`, and everything is
//! bundled into a single deflate-compressed zip whose internal names match
//! the on-disk names. File order and naming are stable across runs.

use crate::error::Result;
use crate::link::LinkCollector;
use crate::record::RecordCollector;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const LINKS_FILE: &str = "links.csv";

/// What a finalized run left on disk.
#[derive(Debug, Clone)]
pub struct ArchiveManifest {
    pub files: Vec<PathBuf>,
    pub archive: PathBuf,
}

#[derive(Debug)]
pub struct ArchiveBuilder {
    out_dir: PathBuf,
}

impl ArchiveBuilder {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Flush every table to disk and bundle the lot. Headers are written
    /// even for empty tables so the import schema stays constant.
    ///
    /// This runs exactly once per scan, on every exit path: completed,
    /// limit-reached and aborted runs all package whatever was collected.
    pub fn finalize(
        &self,
        records: &RecordCollector,
        links: &LinkCollector,
        archive_name: &str,
    ) -> Result<ArchiveManifest> {
        fs::create_dir_all(&self.out_dir)?;

        let mut files = Vec::new();
        files.push(self.write_links(links)?);
        for table in records.tables() {
            let path = self.out_dir.join(table.spec().file_name());
            debug!("writing {} rows to {}", table.len(), path.display());
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(table.spec().header())?;
            for row in table.rows() {
                writer.write_record(row)?;
            }
            writer.flush()?;
            files.push(path);
        }

        let archive = self.bundle(&files, archive_name)?;
        Ok(ArchiveManifest { files, archive })
    }

    fn write_links(&self, links: &LinkCollector) -> Result<PathBuf> {
        let path = self.out_dir.join(LINKS_FILE);
        debug!("writing {} edges to {}", links.len(), path.display());
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["Source", "Target", "Association"])?;
        for edge in links.rows() {
            writer.write_record([&edge.source, &edge.target, &edge.association])?;
        }
        writer.flush()?;
        Ok(path)
    }

    fn bundle(&self, files: &[PathBuf], archive_name: &str) -> Result<PathBuf> {
        let archive_path = self.out_dir.join(format!("{}.zip", archive_name));
        info!("creating archive {}", archive_path.display());

        let file = File::create(&archive_path)?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(LINKS_FILE);
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(path)?)?;
        }
        zip.finish()?;
        Ok(archive_path)
    }
}

