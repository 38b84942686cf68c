//! Zip-based notebook bundles
//!
//! A bundle is a zip archive with a `parse_map.json` manifest at its root
//! describing every other entry and the store it belongs to.

mod archive;
mod error;
pub mod export;
pub mod import;
pub mod manifest;

pub use archive::BundleArchive;
pub use error::{BundleError, Result};
pub use export::{
    export_stores, export_stores_to_path, inspect, pack_directory, BundleInspection, BundleWriter,
    PackSummary,
};
pub use import::{ImportReport, ItemOutcome, ItemStatus, NotebookImporter, SkipReason};
pub use manifest::{Kind, Manifest, ManifestItem, MANIFEST_FILE};
