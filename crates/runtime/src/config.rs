use crate::error::RuntimeError;
use connectors::{kerberos::KerberosConfig, ConnectorEntry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_request_deadline_secs() -> u64 {
    300
}

/// The closed option set the core consumes, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub metadata_base_dir: PathBuf,
    pub result_tmp_dir: PathBuf,
    /// Minutes a completed result set lives before the sweeper reclaims
    /// it; also the sweep interval.
    pub result_set_expiry: u64,
    #[serde(default)]
    pub connectors: Vec<ConnectorEntry>,
    #[serde(default)]
    pub kerberos_client_keytab: Option<PathBuf>,
    #[serde(default)]
    pub kerberos_client_uid: Option<String>,
    /// Upper bound on one request's wall-clock time; sources without
    /// bounded duration are aborted through this.
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, RuntimeError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| RuntimeError::Config(format!("{}: {e}", path.display())))
    }

    pub fn kerberos(&self) -> KerberosConfig {
        KerberosConfig {
            client_keytab: self.kerberos_client_keytab.clone(),
            client_uid: self.kerberos_client_uid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let raw = serde_json::json!({
            "metadata_base_dir": "/tmp/meta",
            "result_tmp_dir": "/tmp/results",
            "result_set_expiry": 30,
        });
        let config: Config = serde_json::from_value(raw).unwrap();
        assert_eq!(config.request_deadline_secs, 300);
        assert!(config.connectors.is_empty());
        assert!(!config.kerberos().is_configured());
    }

    #[test]
    fn connector_entries_parse_from_config_shape() {
        let raw = serde_json::json!({
            "metadata_base_dir": "/tmp/meta",
            "result_tmp_dir": "/tmp/results",
            "result_set_expiry": 30,
            "connectors": [
                {"class": "file", "type": "CSV"},
                {"class": "relational", "type": "PostgreSQL", "version": 15,
                 "constants": {"connection_template": "Driver=$driver", "driver": "x"}},
            ],
        });
        let config: Config = serde_json::from_value(raw).unwrap();
        assert_eq!(config.connectors.len(), 2);
        assert_eq!(config.connectors[1].version, Some(15));
    }
}
