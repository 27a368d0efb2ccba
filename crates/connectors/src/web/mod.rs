pub mod spnego;

use crate::{
    error::ConnectorError,
    file::json,
    kerberos::{self, KerberosConfig},
    request::{FetchRequest, ResultHandle},
    result_path::ResultPath,
    spec::DataSourceSpec,
    web::spnego::{NegotiateClient, TokenSourceFactory},
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// One queryable mapping of a web-API source: the GET target and where the
/// rows live in its JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointMapping {
    pub url: String,
    #[serde(default)]
    pub result_path: Option<String>,
}

/// Connector over a JSON REST service. GET only; `application/json` only;
/// SPNEGO negotiation per request when the server demands it.
pub struct WebApiConnector {
    mappings: HashMap<String, EndpointMapping>,
    client: NegotiateClient,
    kerberos: KerberosConfig,
}

impl WebApiConnector {
    pub fn from_spec(
        spec: &DataSourceSpec,
        kerberos: KerberosConfig,
        tokens: Option<TokenSourceFactory>,
    ) -> Result<Self, ConnectorError> {
        let mappings: HashMap<String, EndpointMapping> = spec
            .properties
            .get("endpoint_mappings")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                ConnectorError::Connect(format!(
                    "invalid endpoint_mappings on data source '{}': {e}",
                    spec.name
                ))
            })?
            .unwrap_or_default();

        let service = spec.prop_str("spn").map(str::to_string);
        Ok(WebApiConnector {
            mappings,
            client: NegotiateClient::new(tokens, service),
            kerberos,
        })
    }

    pub async fn prepare(&self, request: &FetchRequest) -> Result<ResultHandle, ConnectorError> {
        let mapping = self
            .mappings
            .get(&request.src)
            .ok_or_else(|| ConnectorError::UnknownMapping(request.src.clone()))?;

        kerberos::kinit(&self.kerberos).await?;

        debug!(url = %mapping.url, "fetching web-API rows");
        let doc = self.client.get_json(&mapping.url).await?;

        let result_path = match &mapping.result_path {
            Some(p) => ResultPath::parse(p)?,
            None => ResultPath::root(),
        };
        json::rows_from_document(&doc, &result_path, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mapping_is_a_typed_error() {
        let spec = DataSourceSpec::new("api", "WebApi", None).with_properties(serde_json::json!({
            "endpoint_mappings": {
                "users": {"url": "http://example.test/users", "result_path": "$.result"}
            }
        }));
        let connector =
            WebApiConnector::from_spec(&spec, KerberosConfig::default(), None).unwrap();
        let request = FetchRequest {
            data_source: "api".into(),
            src: "absent".into(),
            alias: "a".into(),
            attributes: vec![],
        };
        let err = futures_executor(connector.prepare(&request)).unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownMapping(name) if name == "absent"));
    }

    #[test]
    fn malformed_mappings_are_rejected() {
        let spec = DataSourceSpec::new("api", "WebApi", None)
            .with_properties(serde_json::json!({"endpoint_mappings": [1, 2, 3]}));
        assert!(WebApiConnector::from_spec(&spec, KerberosConfig::default(), None).is_err());
    }

    fn futures_executor<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
