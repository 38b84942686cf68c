//! Notebook bundle import and backend session state.
//!
//! - [`bundle`] reads and writes zip bundles described by `parse_map.json`
//!   and distributes their entries into stores.
//! - [`sinks`] defines those stores and provides in-memory versions.
//! - [`client`] talks to the notebook backend and keeps session state.

pub mod bundle;
pub mod client;
pub mod config;
pub mod notify;
pub mod sinks;

pub use bundle::{ImportReport, NotebookImporter};
pub use config::Config;
pub use notify::{LogNotifier, Notification, Notifier};
pub use sinks::{ImportTargets, Stores};
