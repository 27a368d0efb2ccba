use connectors::{DataSourceSpec, EndpointSpec, ModelSpec};
use std::collections::HashMap;

/// Read-only metadata view consumed by the planner and the request
/// lifecycle. Names are case-insensitive; implementations lowercase keys.
pub trait MetadataFacade: Send + Sync {
    fn data_source(&self, name: &str) -> Option<DataSourceSpec>;
    fn model(&self, name: &str) -> Option<ModelSpec>;
    fn endpoint(&self, name: &str) -> Option<EndpointSpec>;
}

/// Map-backed facade used by tests and by callers that assemble metadata
/// programmatically.
#[derive(Default)]
pub struct InMemoryMetadata {
    data_sources: HashMap<String, DataSourceSpec>,
    models: HashMap<String, ModelSpec>,
    endpoints: HashMap<String, EndpointSpec>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_source(mut self, spec: DataSourceSpec) -> Self {
        self.data_sources.insert(spec.name.to_lowercase(), spec);
        self
    }

    pub fn with_model(mut self, model: ModelSpec) -> Self {
        self.models.insert(model.name.to_lowercase(), model);
        self
    }

    pub fn with_endpoint(mut self, endpoint: EndpointSpec) -> Self {
        self.endpoints.insert(endpoint.name.to_lowercase(), endpoint);
        self
    }
}

impl MetadataFacade for InMemoryMetadata {
    fn data_source(&self, name: &str) -> Option<DataSourceSpec> {
        self.data_sources.get(&name.to_lowercase()).cloned()
    }

    fn model(&self, name: &str) -> Option<ModelSpec> {
        self.models.get(&name.to_lowercase()).cloned()
    }

    fn endpoint(&self, name: &str) -> Option<EndpointSpec> {
        self.endpoints.get(&name.to_lowercase()).cloned()
    }
}
