// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{archive_name_for, expand_out_dir, run_arcgis_scan, run_openapi_scan};

// Re-export the report types callers need to interpret a scan
pub use lodestone_core::report::{generate_text_summary, RunStatus, ScanReport};
