use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    CausalSink, CollectionSink, DashboardSink, DataSourceSink, ImportTargets, SinkError,
    SinkResult,
};

/// A restored data source with its companion meta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub data: Value,
    pub meta: Value,
}

#[derive(Debug, Default)]
pub struct DataSourceStore {
    sources: Vec<DataSource>,
}

impl DataSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&DataSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl DataSourceStore {
    /// First `datasource-N` not already taken, starting after the current count
    fn fallback_name(&self) -> String {
        (self.sources.len() + 1..)
            .map(|n| format!("datasource-{}", n))
            .find(|name| self.get(name).is_none())
            .unwrap_or_default()
    }
}

impl DataSourceSink for DataSourceStore {
    fn load_backup_data_store(&mut self, data: Value, meta: Value) -> SinkResult {
        if !meta.is_object() {
            return Err(SinkError::InvalidPayload(
                "data source meta must be a JSON object".to_string(),
            ));
        }
        if !data.is_array() && !data.is_object() {
            return Err(SinkError::InvalidPayload(
                "data source data must be a JSON array or object".to_string(),
            ));
        }

        let name = meta
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_name());

        let source = DataSource { name, data, meta };
        match self.sources.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => {
                log::debug!("Replacing data source '{}'", source.name);
                *existing = source;
            }
            None => self.sources.push(source),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CollectionStore {
    collections: Vec<Value>,
}

/// Stable identifier of a collection: its `id` as a string, if present
fn collection_id(collection: &Value) -> Option<String> {
    match collection.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collections(&self) -> &[Value] {
        &self.collections
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.collections
            .iter()
            .find(|c| collection_id(c).as_deref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    fn upsert(&mut self, collection: Value) {
        let id = collection_id(&collection);
        let existing = id.as_deref().and_then(|id| {
            self.collections
                .iter()
                .position(|c| collection_id(c).as_deref() == Some(id))
        });
        match existing {
            Some(index) => self.collections[index] = collection,
            None => self.collections.push(collection),
        }
    }
}

impl CollectionSink for CollectionStore {
    fn load_backup(&mut self, payload: Value) -> SinkResult {
        let collections = match payload {
            Value::Array(items) => items,
            Value::Object(_) => vec![payload],
            _ => {
                return Err(SinkError::InvalidPayload(
                    "collection backup must be an object or an array of objects".to_string(),
                ))
            }
        };

        // Validate everything first so a bad element leaves the store untouched
        if let Some(position) = collections.iter().position(|c| !c.is_object()) {
            return Err(SinkError::InvalidPayload(format!(
                "collection at index {} is not an object",
                position
            )));
        }

        for collection in collections {
            self.upsert(collection);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CausalStore {
    model: Option<Value>,
}

impl CausalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&Value> {
        self.model.as_ref()
    }
}

impl CausalSink for CausalStore {
    fn load(&mut self, payload: Value) -> SinkResult {
        if !payload.is_object() {
            return Err(SinkError::InvalidPayload(
                "causal model must be a JSON object".to_string(),
            ));
        }
        self.model = Some(payload);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DashboardStore {
    dashboards: Vec<Value>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dashboards(&self) -> &[Value] {
        &self.dashboards
    }

    pub fn len(&self) -> usize {
        self.dashboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }
}

impl DashboardSink for DashboardStore {
    fn load_all(&mut self, payload: Value) -> SinkResult {
        match payload {
            Value::Array(dashboards) => {
                self.dashboards = dashboards;
                Ok(())
            }
            _ => Err(SinkError::InvalidPayload(
                "dashboards must be a JSON array".to_string(),
            )),
        }
    }
}

/// Counts of what each store currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub data_sources: Vec<String>,
    pub collection_count: usize,
    pub has_causal_model: bool,
    pub dashboard_count: usize,
}

/// The full set of in-memory stores an import fills
#[derive(Debug, Default)]
pub struct Stores {
    pub data_sources: DataSourceStore,
    pub collections: CollectionStore,
    pub causal: CausalStore,
    pub dashboards: DashboardStore,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&mut self) -> ImportTargets<'_> {
        ImportTargets {
            data_sources: &mut self.data_sources,
            collections: &mut self.collections,
            causal: &mut self.causal,
            dashboards: &mut self.dashboards,
        }
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            data_sources: self
                .data_sources
                .sources()
                .iter()
                .map(|s| s.name.clone())
                .collect(),
            collection_count: self.collections.len(),
            has_causal_model: self.causal.model().is_some(),
            dashboard_count: self.dashboards.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_named_from_meta() {
        let mut store = DataSourceStore::new();
        store
            .load_backup_data_store(json!([{"x": 1}]), json!({"name": "sales"}))
            .unwrap();
        store
            .load_backup_data_store(json!({"rows": []}), json!({}))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("sales").is_some());
        assert!(store.get("datasource-2").is_some());
    }

    #[test]
    fn test_unnamed_data_source_never_replaces_existing() {
        let mut store = DataSourceStore::new();
        store
            .load_backup_data_store(json!([1]), json!({"name": "sales"}))
            .unwrap();
        store
            .load_backup_data_store(json!([2]), json!({"name": "datasource-2"}))
            .unwrap();
        store.load_backup_data_store(json!([3]), json!({})).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("datasource-2").unwrap().data, json!([2]));
        assert_eq!(store.get("datasource-3").unwrap().data, json!([3]));
    }

    #[test]
    fn test_data_source_replaces_same_name() {
        let mut store = DataSourceStore::new();
        store
            .load_backup_data_store(json!([1]), json!({"name": "a"}))
            .unwrap();
        store
            .load_backup_data_store(json!([2]), json!({"name": "a"}))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().data, json!([2]));
    }

    #[test]
    fn test_data_source_rejects_bad_meta() {
        let mut store = DataSourceStore::new();
        let result = store.load_backup_data_store(json!([]), json!("meta"));
        assert!(matches!(result, Err(SinkError::InvalidPayload(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_collection_upsert_by_id() {
        let mut store = CollectionStore::new();
        store
            .load_backup(json!([{"id": "c1", "v": 1}, {"id": 2}, {"title": "no id"}]))
            .unwrap();
        store.load_backup(json!({"id": "c1", "v": 2})).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("c1").unwrap()["v"], 2);
        assert!(store.get("2").is_some());
    }

    #[test]
    fn test_collection_rejects_partially_bad_batch() {
        let mut store = CollectionStore::new();
        let result = store.load_backup(json!([{"id": "ok"}, 42]));

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_causal_and_dashboards() {
        let mut stores = Stores::new();
        stores.causal.load(json!({"nodes": [], "edges": []})).unwrap();
        stores.dashboards.load_all(json!([{"id": "d1"}])).unwrap();
        stores.dashboards.load_all(json!([{"id": "d2"}, {"id": "d3"}])).unwrap();

        assert!(stores.causal.load(json!([])).is_err());
        assert!(stores.dashboards.load_all(json!({})).is_err());

        let summary = stores.summary();
        assert!(summary.has_causal_model);
        assert_eq!(summary.dashboard_count, 2);
    }
}
