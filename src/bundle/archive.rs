use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use super::error::{BundleError, Result};
use super::manifest::{Manifest, MANIFEST_FILE};

/// Random-access view over a bundle's zip entries
///
/// The archive owns its reader; dropping it releases the underlying handle.
pub struct BundleArchive<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl BundleArchive<File> {
    pub fn open_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

impl<'a> BundleArchive<Cursor<&'a [u8]>> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> BundleArchive<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Names of all file entries (directories excluded)
    pub fn entry_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    /// Read an entry's raw payload
    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .archive
            .index_for_name(name)
            .ok_or_else(|| BundleError::EntryNotFound(name.to_string()))?;
        let mut entry = self.archive.by_index(index)?;
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read an entry as UTF-8 text
    pub fn read_text(&mut self, name: &str) -> Result<String> {
        let bytes = self.read_bytes(name)?;
        String::from_utf8(bytes).map_err(|_| BundleError::InvalidUtf8(name.to_string()))
    }

    /// Read an entry and parse it as JSON
    pub fn read_json(&mut self, name: &str) -> Result<serde_json::Value> {
        let text = self.read_text(name)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Read and parse `parse_map.json`
    pub fn manifest(&mut self) -> Result<Manifest> {
        if !self.contains(MANIFEST_FILE) {
            return Err(BundleError::ManifestMissing(MANIFEST_FILE.to_string()));
        }
        let text = self.read_text(MANIFEST_FILE)?;
        Ok(Manifest::from_json(&text)?)
    }
}
