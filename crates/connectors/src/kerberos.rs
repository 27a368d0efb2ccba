use crate::error::ConnectorError;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Client credentials used for outbound Kerberos (relational and web-API
/// sources). When unset, sources are contacted without authentication.
#[derive(Debug, Clone, Default)]
pub struct KerberosConfig {
    pub client_keytab: Option<PathBuf>,
    pub client_uid: Option<String>,
}

impl KerberosConfig {
    pub fn is_configured(&self) -> bool {
        self.client_keytab.is_some() && self.client_uid.is_some()
    }
}

/// Obtain a ticket for the configured client principal. No-op when the
/// config carries no keytab.
pub async fn kinit(config: &KerberosConfig) -> Result<(), ConnectorError> {
    let (Some(keytab), Some(uid)) = (&config.client_keytab, &config.client_uid) else {
        return Ok(());
    };

    debug!(principal = %uid, "running kinit");
    let status = Command::new("kinit")
        .arg("-kt")
        .arg(keytab)
        .arg(uid)
        .status()
        .await
        .map_err(|e| ConnectorError::Kerberos(format!("failed to spawn kinit: {e}")))?;

    if !status.success() {
        return Err(ConnectorError::Kerberos(format!(
            "kinit exited with {status} for principal {uid}"
        )));
    }
    Ok(())
}
