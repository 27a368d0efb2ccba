pub mod conn_str;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod select;

use crate::{
    error::ConnectorError,
    kerberos::{self, KerberosConfig},
    request::{FetchRequest, ResultHandle},
    spec::DataSourceSpec,
};
use serde::Deserialize;

/// Registry constants shared by every data source of one relational
/// `(type, version)`: the ODBC driver name and the connection-string
/// template it is spliced into.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationalConstants {
    pub connection_template: String,
    pub driver: String,
}

impl RelationalConstants {
    pub fn from_json(constants: &serde_json::Value) -> Result<Self, ConnectorError> {
        serde_json::from_value(constants.clone()).map_err(|e| {
            ConnectorError::Connect(format!("invalid relational connector constants: {e}"))
        })
    }
}

/// Connector over an ODBC data source. Kerberos-only authentication: a
/// ticket is obtained before the connection is opened and the configured
/// client principal is substituted into the connection string.
#[derive(Debug)]
pub struct RelationalConnector {
    conn_str: String,
    kerberos: KerberosConfig,
}

impl RelationalConnector {
    pub fn from_spec(
        spec: &DataSourceSpec,
        constants: &serde_json::Value,
        kerberos: KerberosConfig,
    ) -> Result<Self, ConnectorError> {
        let constants = RelationalConstants::from_json(constants)?;
        let uid = kerberos.client_uid.clone().unwrap_or_default();
        let conn_str = conn_str::render_template(
            &constants.connection_template,
            &[
                ("driver", &constants.driver),
                ("hostname", spec.prop_str("hostname").unwrap_or_default()),
                ("database", spec.prop_str("database").unwrap_or_default()),
                ("spn", spec.prop_str("spn").unwrap_or_default()),
                ("uid", &uid),
            ],
        );
        Ok(RelationalConnector { conn_str, kerberos })
    }

    pub fn connection_string(&self) -> &str {
        &self.conn_str
    }

    #[cfg(feature = "odbc")]
    pub async fn prepare(&self, request: &FetchRequest) -> Result<ResultHandle, ConnectorError> {
        kerberos::kinit(&self.kerberos).await?;
        let conn_str = self.conn_str.clone();
        let request = request.clone();
        let (columns, rows) =
            tokio::task::spawn_blocking(move || odbc::fetch_blocking(&conn_str, &request))
                .await
                .map_err(|e| ConnectorError::Connect(format!("ODBC worker failed: {e}")))??;
        Ok(ResultHandle::new(columns, Box::new(rows.into_iter())))
    }

    #[cfg(not(feature = "odbc"))]
    pub async fn prepare(&self, request: &FetchRequest) -> Result<ResultHandle, ConnectorError> {
        kerberos::kinit(&self.kerberos).await?;
        let _ = request;
        Err(ConnectorError::Unsupported("ODBC relational sources"))
    }
}
