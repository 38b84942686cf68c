use thiserror::Error;

use crate::sinks::SinkError;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid bundle: {0} not found")]
    ManifestMissing(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry {0} is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("Cannot export {0} data sources: a bundle carries a single meta entry shared by every data item")]
    SharedMeta(usize),

    #[error("Store rejected payload: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, BundleError>;
