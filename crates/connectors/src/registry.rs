use crate::{
    adapter::Connector,
    capabilities::{ForceAll, FunctionCapability, RelationalFunctions},
    error::ConnectorError,
    file::FileConnector,
    kerberos::KerberosConfig,
    relational::RelationalConnector,
    spec::DataSourceSpec,
    web::{spnego::TokenSourceFactory, WebApiConnector},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorClass {
    Relational,
    File,
    WebApi,
}

/// One configured `(type, version)` row of the registry. `version: None`
/// is the wildcard fallback used when no exact version matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorEntry {
    pub class: ConnectorClass,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub constants: serde_json::Value,
}

/// Static connector table, built once from configuration and read-only
/// afterwards.
pub struct ConnectorRegistry {
    entries: Vec<ConnectorEntry>,
    kerberos: KerberosConfig,
    token_factory: Option<TokenSourceFactory>,
}

impl ConnectorRegistry {
    pub fn new(entries: Vec<ConnectorEntry>, kerberos: KerberosConfig) -> Self {
        #[cfg(feature = "kerberos")]
        let token_factory = Some(crate::web::spnego::gss::factory());
        #[cfg(not(feature = "kerberos"))]
        let token_factory = None;

        ConnectorRegistry {
            entries,
            kerberos,
            token_factory,
        }
    }

    /// Override the SPNEGO token source, mainly for tests.
    pub fn with_token_factory(mut self, factory: TokenSourceFactory) -> Self {
        self.token_factory = Some(factory);
        self
    }

    /// Exact `(type, version)` match first, wildcard version as fallback.
    pub fn resolve(&self, source_type: &str, version: Option<i64>) -> Option<&ConnectorEntry> {
        self.entries
            .iter()
            .find(|e| {
                e.source_type.eq_ignore_ascii_case(source_type) && e.version == version
            })
            .or_else(|| {
                self.entries.iter().find(|e| {
                    e.source_type.eq_ignore_ascii_case(source_type) && e.version.is_none()
                })
            })
    }

    pub fn resolve_spec(&self, spec: &DataSourceSpec) -> Result<&ConnectorEntry, ConnectorError> {
        self.resolve(&spec.source_type, spec.version)
            .ok_or_else(|| ConnectorError::NotRegistered {
                source_type: spec.source_type.clone(),
                version: spec.version,
            })
    }

    /// The function capability module for a connector class. Flat files
    /// and REST sources force platform evaluation of everything.
    pub fn function_module(&self, class: ConnectorClass) -> Arc<dyn FunctionCapability> {
        match class {
            ConnectorClass::Relational => Arc::new(RelationalFunctions),
            ConnectorClass::File | ConnectorClass::WebApi => Arc::new(ForceAll),
        }
    }

    pub fn function_module_for(
        &self,
        spec: &DataSourceSpec,
    ) -> Result<Arc<dyn FunctionCapability>, ConnectorError> {
        let entry = self.resolve_spec(spec)?;
        Ok(self.function_module(entry.class))
    }

    /// Open a connector for a data source. Side effects (kinit, sockets,
    /// file descriptors) happen lazily in `prepare`.
    pub fn connect(&self, spec: &DataSourceSpec) -> Result<Connector, ConnectorError> {
        let entry = self.resolve_spec(spec)?;
        match entry.class {
            ConnectorClass::File => Ok(Connector::File(FileConnector::from_spec(spec)?)),
            ConnectorClass::WebApi => Ok(Connector::WebApi(WebApiConnector::from_spec(
                spec,
                self.kerberos.clone(),
                self.token_factory.clone(),
            )?)),
            ConnectorClass::Relational => Ok(Connector::Relational(
                RelationalConnector::from_spec(spec, &entry.constants, self.kerberos.clone())?,
            )),
        }
    }
}
