//! File-backed schema and table source.
//!
//! Schemas live under `<dir>/schemas/*.json` (one schema per file,
//! keyed by file stem) and lookup tables under `<dir>/tables/*.json`.
//! Both are loaded once at startup; `tables()` serves clones of the
//! canonical in-memory mapping, and `write_table` updates the
//! canonical copy and rewrites the table file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use geofan_schema::SchemaNode;
use tokio::sync::RwLock;

use crate::error::ProviderError;
use crate::traits::GeoDataSource;
use crate::types::{SchemaMap, Table, TableMap};

pub struct FileDataSource {
    dir: PathBuf,
    schemas: SchemaMap,
    tables: RwLock<TableMap>,
}

impl FileDataSource {
    /// Loads every schema and table file under `dir`.
    pub async fn load(dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let dir = dir.into();
        let mut schemas = SchemaMap::new();
        for (name, raw) in read_json_dir(&dir.join("schemas")).await? {
            let node: SchemaNode = serde_json::from_value(raw)?;
            schemas.insert(name, node);
        }

        let mut tables = TableMap::new();
        for (name, raw) in read_json_dir(&dir.join("tables")).await? {
            let table = raw.as_object().cloned().ok_or_else(|| {
                ProviderError::invalid_schema(format!("table file '{name}' is not a JSON object"))
            })?;
            tables.insert(name, table);
        }

        tracing::info!(
            dir = %dir.display(),
            schemas = schemas.len(),
            tables = tables.len(),
            "data source loaded"
        );

        Ok(Self {
            dir,
            schemas,
            tables: RwLock::new(tables),
        })
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join("tables").join(format!("{name}.json"))
    }
}

#[async_trait]
impl GeoDataSource for FileDataSource {
    async fn schemas(&self) -> Result<SchemaMap, ProviderError> {
        Ok(self.schemas.clone())
    }

    async fn tables(&self) -> Result<TableMap, ProviderError> {
        Ok(self.tables.read().await.clone())
    }

    async fn write_table(&self, name: &str, snapshot: &Table) -> Result<(), ProviderError> {
        // The guard stays held across the file write so concurrent
        // persists hit the disk in the same order as the in-memory
        // updates.
        let mut tables = self.tables.write().await;
        if !tables.contains_key(name) {
            return Err(ProviderError::table_not_found(name));
        }
        tables.insert(name.to_string(), snapshot.clone());

        let serialized = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(self.table_path(name), serialized).await?;
        tracing::debug!(table = name, codes = snapshot.len(), "table persisted");
        Ok(())
    }
}

/// Reads every `*.json` file in `dir` into (stem, value) pairs, sorted
/// by name for a stable load order.
async fn read_json_dir(dir: &Path) -> Result<Vec<(String, serde_json::Value)>, ProviderError> {
    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = tokio::fs::read(&path).await?;
        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        entries.push((stem.to_string(), value));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seed_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        let tables = dir.path().join("tables");
        tokio::fs::create_dir_all(&schemas).await.unwrap();
        tokio::fs::create_dir_all(&tables).await.unwrap();

        tokio::fs::write(
            schemas.join("api-in.json"),
            json!({"properties": {"params": {}}, "required": ["params"]}).to_string(),
        )
        .await
        .unwrap();
        tokio::fs::write(
            tables.join("province.json"),
            json!({"ON": "Ontario", "QC": "Quebec"}).to_string(),
        )
        .await
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_schemas_and_tables() {
        let dir = seed_dir().await;
        let source = FileDataSource::load(dir.path()).await.unwrap();

        let schemas = source.schemas().await.unwrap();
        assert!(schemas.contains_key("api-in"));

        let tables = source.tables().await.unwrap();
        assert_eq!(tables["province"]["ON"], json!("Ontario"));
    }

    #[tokio::test]
    async fn test_write_table_updates_memory_and_file() {
        let dir = seed_dir().await;
        let source = FileDataSource::load(dir.path()).await.unwrap();

        let mut snapshot = Table::new();
        snapshot.insert("ON".to_string(), json!("Ontario"));
        snapshot.insert("NB".to_string(), json!("New Brunswick"));
        source.write_table("province", &snapshot).await.unwrap();

        let tables = source.tables().await.unwrap();
        assert_eq!(tables["province"]["NB"], json!("New Brunswick"));

        let on_disk =
            tokio::fs::read(dir.path().join("tables").join("province.json")).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&on_disk).unwrap();
        assert_eq!(parsed["NB"], json!("New Brunswick"));
    }

    #[tokio::test]
    async fn test_write_unknown_table_rejected() {
        let dir = seed_dir().await;
        let source = FileDataSource::load(dir.path()).await.unwrap();

        let err = source.write_table("bogus", &Table::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::TableNotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_writes_keep_file_and_memory_aligned() {
        let dir = seed_dir().await;
        let source = std::sync::Arc::new(FileDataSource::load(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                let mut snapshot = Table::new();
                snapshot.insert("ON".to_string(), json!(format!("Ontario-{i}")));
                source.write_table("province", &snapshot).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Whichever write landed last, the file must match memory.
        let in_memory = source.tables().await.unwrap()["province"].clone();
        let on_disk =
            tokio::fs::read(dir.path().join("tables").join("province.json")).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&on_disk).unwrap();
        assert_eq!(serde_json::Value::Object(in_memory), parsed);
    }

    #[tokio::test]
    async fn test_caller_mutations_stay_request_scoped() {
        let dir = seed_dir().await;
        let source = FileDataSource::load(dir.path()).await.unwrap();

        let mut request_copy = source.tables().await.unwrap();
        request_copy
            .get_mut("province")
            .unwrap()
            .insert("XX".to_string(), json!("Nowhere"));

        let fresh = source.tables().await.unwrap();
        assert!(!fresh["province"].contains_key("XX"));
    }
}
