//! Stores that receive the payloads of an imported bundle
//!
//! Each trait is one collaborator of the importer. The in-memory
//! implementations live in `memory`.

mod memory;

pub use memory::{
    CollectionStore, CausalStore, DashboardStore, DataSource, DataSourceStore, StoreSummary,
    Stores,
};

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

pub type SinkResult = std::result::Result<(), SinkError>;

pub trait DataSourceSink {
    /// Restore one data source from its data payload and companion meta
    fn load_backup_data_store(&mut self, data: Value, meta: Value) -> SinkResult;
}

pub trait CollectionSink {
    fn load_backup(&mut self, payload: Value) -> SinkResult;
}

pub trait CausalSink {
    fn load(&mut self, payload: Value) -> SinkResult;
}

pub trait DashboardSink {
    /// Replace every dashboard with the payload's contents
    fn load_all(&mut self, payload: Value) -> SinkResult;
}

/// The four sinks an import distributes into, borrowed for one call
pub struct ImportTargets<'a> {
    pub data_sources: &'a mut dyn DataSourceSink,
    pub collections: &'a mut dyn CollectionSink,
    pub causal: &'a mut dyn CausalSink,
    pub dashboards: &'a mut dyn DashboardSink,
}
