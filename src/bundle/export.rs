//! Writing bundles: from in-memory stores, or by packing a directory

use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::archive::BundleArchive;
use super::error::{BundleError, Result};
use super::manifest::{Kind, Manifest, ManifestItem, MANIFEST_FILE};
use crate::sinks::Stores;

/// Streams entries into a zip and appends the manifest on `finish`
pub struct BundleWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    manifest: Manifest,
}

impl<W: Write + Seek> BundleWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            manifest: Manifest::default(),
        }
    }

    pub fn add_raw(&mut self, name: &str, key: Kind, item_type: Kind, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(bytes)?;
        self.manifest.items.push(ManifestItem::new(name, key, item_type));
        Ok(())
    }

    pub fn add_json(&mut self, name: &str, key: Kind, item_type: Kind, value: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        self.add_raw(name, key, item_type, content.as_bytes())
    }

    /// Write `parse_map.json` and close the archive
    pub fn finish(mut self) -> Result<(Manifest, W)> {
        let manifest_json = serde_json::to_string_pretty(&self.manifest)?;
        self.zip.start_file(MANIFEST_FILE, self.options)?;
        self.zip.write_all(manifest_json.as_bytes())?;
        let writer = self.zip.finish()?;
        Ok((self.manifest, writer))
    }
}

/// The importer pairs every data item with the first meta item, so a bundle
/// can only carry one data source without losing the others' meta.
fn ensure_exportable(stores: &Stores) -> Result<()> {
    let count = stores.data_sources.len();
    if count > 1 {
        return Err(BundleError::SharedMeta(count));
    }
    Ok(())
}

/// Write the contents of every store as a bundle the importer can read back
pub fn export_stores<W: Write + Seek>(stores: &Stores, writer: W) -> Result<Manifest> {
    ensure_exportable(stores)?;
    let mut bundle = BundleWriter::new(writer);

    let sources = stores.data_sources.sources();
    for (index, source) in sources.iter().enumerate() {
        let name = format!("data/{}.json", index + 1);
        bundle.add_json(&name, Kind::Data, Kind::Data, &source.data)?;
    }
    if let Some(first) = sources.first() {
        bundle.add_json("meta.json", Kind::Meta, Kind::Meta, &first.meta)?;
    }

    if !stores.collections.is_empty() {
        let collections = Value::Array(stores.collections.collections().to_vec());
        bundle.add_json("collection.json", Kind::Collection, Kind::Collection, &collections)?;
    }
    if let Some(model) = stores.causal.model() {
        bundle.add_json("causal.json", Kind::Causal, Kind::Causal, model)?;
    }
    if !stores.dashboards.is_empty() {
        let dashboards = Value::Array(stores.dashboards.dashboards().to_vec());
        bundle.add_json("dashboard.json", Kind::Dashboard, Kind::Dashboard, &dashboards)?;
    }

    let (manifest, _) = bundle.finish()?;
    log::info!("Exported bundle with {} items", manifest.items.len());
    Ok(manifest)
}

/// Export the stores to a file on disk
pub fn export_stores_to_path(stores: &Stores, output_path: &Path) -> Result<Manifest> {
    ensure_exportable(stores)?;
    let file = File::create(output_path)?;
    let result = export_stores(stores, file);
    if result.is_err() {
        let _ = fs::remove_file(output_path);
    }
    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackSummary {
    pub manifest_version: String,
    pub file_count: usize,
    /// Manifest items with no file in the packed directory
    pub missing: Vec<String>,
}

/// Zip a directory that already holds a `parse_map.json` at its root
///
/// The output may live inside `dir`; it is never packed into itself. A
/// partially written output is removed on failure.
pub fn pack_directory(dir: &Path, output_path: &Path) -> Result<PackSummary> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(BundleError::ManifestMissing(MANIFEST_FILE.to_string()));
    }
    let manifest = Manifest::from_json(&fs::read_to_string(&manifest_path)?)?;

    let file = File::create(output_path)?;
    let packed = match write_directory(dir, output_path, file) {
        Ok(packed) => packed,
        Err(e) => {
            let _ = fs::remove_file(output_path);
            return Err(e);
        }
    };

    let missing: Vec<String> = manifest
        .items
        .iter()
        .filter(|item| !packed.contains(&item.name))
        .map(|item| item.name.clone())
        .collect();
    for name in &missing {
        log::warn!("Manifest lists {} but it is not in {:?}", name, dir);
    }

    Ok(PackSummary {
        manifest_version: manifest.version,
        file_count: packed.len(),
        missing,
    })
}

/// Write every file under `dir` into `file`, returning the entry names
fn write_directory(dir: &Path, output_path: &Path, file: File) -> Result<Vec<String>> {
    // Compare canonical paths so `..`, `./` or symlinks cannot hide the output
    let output = fs::canonicalize(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut packed = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| BundleError::Io(std::io::Error::other(e.to_string())))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if fs::canonicalize(path).is_ok_and(|p| p == output) {
            log::debug!("Skipping pack output {:?}", path);
            continue;
        }

        let relative_path = path
            .strip_prefix(dir)
            .map_err(|_| BundleError::Io(std::io::Error::other("Failed to get relative path")))?;
        // Zip entry names always use forward slashes
        let name = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), options)?;
        let mut file_content = Vec::new();
        File::open(path)?.read_to_end(&mut file_content)?;
        zip.write_all(&file_content)?;
        packed.push(name);
    }

    zip.finish()?;
    Ok(packed)
}

/// Resolution status of one manifest item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedItem {
    #[serde(flatten)]
    pub item: ManifestItem,
    pub present: bool,
}

/// What a bundle contains, without importing it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInspection {
    pub manifest_version: String,
    pub items: Vec<InspectedItem>,
    /// Name of the meta entry data items will be paired with
    pub meta_companion: Option<String>,
    /// Archive entries the manifest does not mention
    pub unreferenced: Vec<String>,
}

pub fn inspect<R: Read + Seek>(archive: &mut BundleArchive<R>) -> Result<BundleInspection> {
    let manifest = archive.manifest()?;

    let items = manifest
        .items
        .iter()
        .map(|item| InspectedItem {
            item: item.clone(),
            present: archive.contains(&item.name),
        })
        .collect();

    let unreferenced = archive
        .entry_names()
        .into_iter()
        .filter(|name| name != MANIFEST_FILE && !manifest.items.iter().any(|i| &i.name == name))
        .collect();

    Ok(BundleInspection {
        meta_companion: manifest.meta_companion().map(|m| m.name.clone()),
        manifest_version: manifest.version,
        items,
        unreferenced,
    })
}
