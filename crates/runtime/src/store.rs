use connectors::{DataSourceSpec, EndpointSpec, ModelSpec};
use planner::MetadataFacade;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Keyed metadata store over sled trees: `data_sources`, `models`,
/// `endpoints`, `result_sets`. Keys are lowercased on read and write;
/// payloads keep their display casing.
pub struct SledMetadataStore {
    db: sled::Db,
    data_sources: sled::Tree,
    models: sled::Tree,
    endpoints: sled::Tree,
    result_sets: sled::Tree,
}

impl SledMetadataStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(SledMetadataStore {
            data_sources: db.open_tree("data_sources")?,
            models: db.open_tree("models")?,
            endpoints: db.open_tree("endpoints")?,
            result_sets: db.open_tree("result_sets")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn put_data_source(&self, spec: &DataSourceSpec) -> Result<(), StoreError> {
        put(&self.data_sources, &spec.name, spec)
    }

    pub fn get_data_source(&self, name: &str) -> Result<Option<DataSourceSpec>, StoreError> {
        get(&self.data_sources, name)
    }

    pub fn put_model(&self, model: &ModelSpec) -> Result<(), StoreError> {
        put(&self.models, &model.name, model)
    }

    pub fn get_model(&self, name: &str) -> Result<Option<ModelSpec>, StoreError> {
        get(&self.models, name)
    }

    pub fn put_endpoint(&self, endpoint: &EndpointSpec) -> Result<(), StoreError> {
        put(&self.endpoints, &endpoint.name, endpoint)
    }

    pub fn get_endpoint(&self, name: &str) -> Result<Option<EndpointSpec>, StoreError> {
        get(&self.endpoints, name)
    }

    pub fn put_result_set(&self, id: Uuid, path: &Path) -> Result<(), StoreError> {
        put(&self.result_sets, &id.to_string(), &PathBuf::from(path))
    }

    pub fn get_result_set(&self, id: Uuid) -> Result<Option<PathBuf>, StoreError> {
        get(&self.result_sets, &id.to_string())
    }

    pub fn remove_result_set(&self, id: Uuid) -> Result<(), StoreError> {
        self.result_sets.remove(id.to_string())?;
        Ok(())
    }
}

fn put<T: Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value)?;
    tree.insert(key.to_lowercase(), bytes)?;
    tree.flush()?;
    Ok(())
}

fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &str) -> Result<Option<T>, StoreError> {
    match tree.get(key.to_lowercase())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

impl MetadataFacade for SledMetadataStore {
    fn data_source(&self, name: &str) -> Option<DataSourceSpec> {
        self.get_data_source(name).unwrap_or_else(|e| {
            warn!(name, error = %e, "data source lookup failed");
            None
        })
    }

    fn model(&self, name: &str) -> Option<ModelSpec> {
        self.get_model(name).unwrap_or_else(|e| {
            warn!(name, error = %e, "model lookup failed");
            None
        })
    }

    fn endpoint(&self, name: &str) -> Option<EndpointSpec> {
        self.get_endpoint(name).unwrap_or_else(|e| {
            warn!(name, error = %e, "endpoint lookup failed");
            None
        })
    }
}
