pub mod arcgis;
pub mod error;
pub mod fetch;
pub mod openapi;
pub mod scan;
pub mod walker;

pub use arcgis::ArcGisStrategy;
pub use error::ScanError;
pub use fetch::{Fetch, HttpFetcher};
pub use openapi::OpenApiStrategy;
pub use scan::{run, ScanOptions};
pub use walker::{OpenNode, ProgressCallback, SchemaStrategy, TreeWalker, WalkOutcome};
