//! Notebook bundle import
//!
//! Reads `parse_map.json` from a bundle and hands every listed entry, parsed
//! as JSON, to the store its `key` names. Items are processed one at a time in
//! manifest order. A failing item is reported and the rest still run; only a
//! bundle that cannot be opened or has no readable manifest aborts the import.

use std::io::{Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::archive::BundleArchive;
use super::error::{BundleError, Result};
use super::manifest::{Kind, Manifest, ManifestItem};
use crate::notify::{Notification, Notifier};
use crate::sinks::ImportTargets;

/// Why an item was not handed to a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "kind")]
pub enum SkipReason {
    /// Meta items are only read as companions of data items
    MetaEntry,
    /// The manifest names an entry the archive does not contain
    EntryMissing,
    /// A data item with no meta-typed item in the manifest
    NoMetaCompanion,
    /// The meta companion is listed but its entry is absent
    MetaEntryMissing,
    /// No store handles this kind
    UnknownKind(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "detail")]
pub enum ItemStatus {
    Loaded,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub name: String,
    pub key: Kind,
    pub status: ItemStatus,
}

/// Structured result of one import call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub manifest_version: Option<String>,
    /// One outcome per manifest item, in manifest order
    pub items: Vec<ItemOutcome>,
    /// Set when the import stopped before processing any item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl ImportReport {
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn loaded_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Loaded)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed(_)))
    }

    /// Neither aborted nor carrying a failed item
    pub fn is_complete(&self) -> bool {
        !self.is_aborted() && self.failures().next().is_none()
    }
}

/// Distributes a bundle's entries into the injected stores
pub struct NotebookImporter<'a> {
    targets: ImportTargets<'a>,
    notifier: &'a dyn Notifier,
}

impl<'a> NotebookImporter<'a> {
    pub fn new(targets: ImportTargets<'a>, notifier: &'a dyn Notifier) -> Self {
        Self { targets, notifier }
    }

    /// Import a bundle from a file on disk
    pub fn import_path(&mut self, path: &Path) -> ImportReport {
        log::info!("Importing notebook bundle {:?}", path);
        self.run(BundleArchive::open_path(path))
    }

    /// Import a bundle held in memory
    pub fn import_bytes(&mut self, bytes: &[u8]) -> ImportReport {
        self.run(BundleArchive::from_bytes(bytes))
    }

    pub fn import_reader<R: Read + Seek>(&mut self, reader: R) -> ImportReport {
        self.run(BundleArchive::new(reader))
    }

    fn run<R: Read + Seek>(&mut self, opened: Result<BundleArchive<R>>) -> ImportReport {
        let mut archive = match opened {
            Ok(archive) => archive,
            Err(e) => return self.abort(e),
        };
        let manifest = match archive.manifest() {
            Ok(manifest) => manifest,
            Err(e) => return self.abort(e),
        };

        log::debug!(
            "Manifest version {} lists {} items",
            manifest.version,
            manifest.items.len()
        );

        let mut report = ImportReport {
            manifest_version: Some(manifest.version.clone()),
            ..Default::default()
        };

        for item in &manifest.items {
            let status = self.import_item(&mut archive, &manifest, item);
            if let ItemStatus::Failed(message) = &status {
                log::warn!("Failed to import {}: {}", item.name, message);
                self.notifier.notify(Notification::error(
                    "Import error",
                    format!("{}: {}", item.name, message),
                ));
            }
            report.items.push(ItemOutcome {
                name: item.name.clone(),
                key: item.key.clone(),
                status,
            });
        }

        if report.is_complete() {
            self.notifier.notify(Notification::success(
                "Notebook imported",
                format!("{} items loaded", report.loaded_count()),
            ));
        }

        report
    }

    fn abort(&self, error: BundleError) -> ImportReport {
        log::error!("Notebook import aborted: {}", error);
        self.notifier
            .notify(Notification::error("Import failed", error.to_string()));
        ImportReport::aborted(error.to_string())
    }

    fn import_item<R: Read + Seek>(
        &mut self,
        archive: &mut BundleArchive<R>,
        manifest: &Manifest,
        item: &ManifestItem,
    ) -> ItemStatus {
        if item.key == Kind::Meta {
            return ItemStatus::Skipped(SkipReason::MetaEntry);
        }
        if !archive.contains(&item.name) {
            log::warn!("Manifest entry {} not found in bundle, skipping", item.name);
            return ItemStatus::Skipped(SkipReason::EntryMissing);
        }

        match self.route(archive, manifest, item) {
            Ok(status) => status,
            Err(e) => ItemStatus::Failed(e.to_string()),
        }
    }

    fn route<R: Read + Seek>(
        &mut self,
        archive: &mut BundleArchive<R>,
        manifest: &Manifest,
        item: &ManifestItem,
    ) -> Result<ItemStatus> {
        let text = archive.read_text(&item.name)?;

        match &item.key {
            Kind::Data => {
                let Some(meta_item) = manifest.meta_companion() else {
                    log::debug!("No meta item for {}, skipping", item.name);
                    return Ok(ItemStatus::Skipped(SkipReason::NoMetaCompanion));
                };
                if !archive.contains(&meta_item.name) {
                    log::debug!("Meta entry {} not found, skipping {}", meta_item.name, item.name);
                    return Ok(ItemStatus::Skipped(SkipReason::MetaEntryMissing));
                }
                let meta_text = archive.read_text(&meta_item.name)?;
                let data = serde_json::from_str(&text)?;
                let meta = serde_json::from_str(&meta_text)?;
                self.targets.data_sources.load_backup_data_store(data, meta)?;
            }
            Kind::Collection => {
                self.targets.collections.load_backup(serde_json::from_str(&text)?)?;
            }
            Kind::Causal => {
                self.targets.causal.load(serde_json::from_str(&text)?)?;
            }
            Kind::Dashboard => {
                self.targets.dashboards.load_all(serde_json::from_str(&text)?)?;
            }
            Kind::Meta => return Ok(ItemStatus::Skipped(SkipReason::MetaEntry)),
            Kind::Other(kind) => {
                log::debug!("No store for kind '{}', skipping {}", kind, item.name);
                return Ok(ItemStatus::Skipped(SkipReason::UnknownKind(kind.clone())));
            }
        }

        log::debug!("Loaded {} ({})", item.name, item.key);
        Ok(ItemStatus::Loaded)
    }
}
