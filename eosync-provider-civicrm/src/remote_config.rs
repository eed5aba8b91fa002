//! CiviCRM-specific remote configuration.
//!
//! eosync-core passes the `[remote]` table through untyped; this gives the
//! provider a typed view of the keys it understands.

use anyhow::Result;
use eosync_core::remote::RemoteConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credentials profile used when the remote doesn't name one.
pub const DEFAULT_SITE: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CivicrmRemoteConfig {
    /// Base URL of the site hosting CiviCRM, e.g. `https://crm.example.org`.
    pub civicrm_url: String,
    /// Which `[section]` of credentials.toml to use.
    pub civicrm_site: String,
}

impl CivicrmRemoteConfig {
    pub fn new(url: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            civicrm_url: url.into(),
            civicrm_site: site.into(),
        }
    }

    /// The APIv3 REST endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/civicrm/ajax/rest", self.civicrm_url.trim_end_matches('/'))
    }
}

impl From<CivicrmRemoteConfig> for RemoteConfig {
    fn from(config: CivicrmRemoteConfig) -> Self {
        let mut map = HashMap::new();
        map.insert(
            "civicrm_url".to_string(),
            toml::Value::String(config.civicrm_url),
        );
        map.insert(
            "civicrm_site".to_string(),
            toml::Value::String(config.civicrm_site),
        );
        RemoteConfig(map)
    }
}

impl TryFrom<&serde_json::Map<String, serde_json::Value>> for CivicrmRemoteConfig {
    type Error = anyhow::Error;

    fn try_from(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let civicrm_url = map
            .get("civicrm_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing required field: civicrm_url"))?
            .to_string();

        let civicrm_site = map
            .get("civicrm_site")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_SITE)
            .to_string();

        Ok(Self {
            civicrm_url,
            civicrm_site,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn site_defaults_when_absent() {
        let config =
            CivicrmRemoteConfig::try_from(&params(json!({"civicrm_url": "https://crm.test"})))
                .unwrap();
        assert_eq!(config.civicrm_site, DEFAULT_SITE);
    }

    #[test]
    fn url_is_required() {
        let err = CivicrmRemoteConfig::try_from(&params(json!({"civicrm_site": "main"})))
            .unwrap_err();
        assert!(err.to_string().contains("civicrm_url"));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let config = CivicrmRemoteConfig::new("https://crm.test/", "main");
        assert_eq!(config.endpoint(), "https://crm.test/civicrm/ajax/rest");
    }

    #[test]
    fn converts_into_generic_remote_config() {
        let remote: RemoteConfig = CivicrmRemoteConfig::new("https://crm.test", "main").into();
        assert_eq!(
            remote.0.get("civicrm_site"),
            Some(&toml::Value::String("main".into()))
        );
    }
}
