pub mod archive;
pub mod error;
pub mod ident;
pub mod link;
pub mod record;
pub mod report;

pub use archive::{ArchiveBuilder, ArchiveManifest};
pub use error::ExportError;
pub use ident::{IdentBuilder, ROOT_ANCHOR};
pub use link::{DedupPolicy, Edge, LinkCollector};
pub use record::{RecordCollector, RecordRow, TableSpec, REFERENCE_FLAG};
pub use report::{RunStatus, ScanReport};

use colored::Colorize;

pub fn print_banner() {
    println!();
    println!("{}", "  lodestone".bright_cyan().bold());
    println!(
        "{}",
        format!(
            "  catalog metadata exporter v{}",
            env!("CARGO_PKG_VERSION")
        )
        .bright_black()
    );
    println!();
}
