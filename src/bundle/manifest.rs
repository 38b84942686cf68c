use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the manifest entry every bundle carries at its root
pub const MANIFEST_FILE: &str = "parse_map.json";

/// Manifest version written by the exporter
pub const MANIFEST_VERSION: &str = "1.0";

/// Semantic kind of a manifest item
///
/// Unknown kinds are kept verbatim so a bundle written by a newer exporter
/// still parses; the importer routes them to its no-op arm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    Meta,
    Data,
    Collection,
    Causal,
    Dashboard,
    Other(String),
}

impl Kind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Meta => "meta",
            Self::Data => "data",
            Self::Collection => "collection",
            Self::Causal => "causal",
            Self::Dashboard => "dashboard",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Kind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "meta" => Self::Meta,
            "data" => Self::Data,
            "collection" => Self::Collection,
            "causal" => Self::Causal,
            "dashboard" => Self::Dashboard,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Kind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One entry of the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Archive entry filename
    pub name: String,
    /// Selects routing
    pub key: Kind,
    /// Only used to locate the companion meta entry of data items
    #[serde(rename = "type", default = "untyped")]
    pub item_type: Kind,
}

/// Items that omit `type` still route by `key`; they just never act as meta
fn untyped() -> Kind {
    Kind::Other(String::new())
}

impl ManifestItem {
    pub fn new(name: impl Into<String>, key: Kind, item_type: Kind) -> Self {
        Self {
            name: name.into(),
            key,
            item_type,
        }
    }
}

/// Index of a bundle's entries, stored as `parse_map.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub items: Vec<ManifestItem>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            items: Vec::new(),
        }
    }
}

impl Manifest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// First item whose `type` is meta, in manifest order.
    ///
    /// This lookup is global: every data item shares the same companion.
    pub fn meta_companion(&self) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.item_type == Kind::Meta)
    }

    /// Items the importer routes, i.e. everything except meta-keyed items
    pub fn routable_items(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter().filter(|item| item.key != Kind::Meta)
    }
}
