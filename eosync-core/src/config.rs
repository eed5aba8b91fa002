//! Global eosync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::prepare::RecordDefaults;
use crate::remote::Remote;
use crate::site::Site;
use crate::sync::UnmatchedPolicy;

static DEFAULT_SITE_DIR: &str = "~/site";
static DEFAULT_PROVIDER_TIMEOUT: &str = "30s";

fn default_site_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SITE_DIR)
}

fn default_provider_timeout() -> String {
    DEFAULT_PROVIDER_TIMEOUT.to_string()
}

/// Global configuration at ~/.config/eosync/config.toml
///
/// Every key can be overridden from the environment with an `EOSYNC_`
/// prefix, e.g. `EOSYNC_DELETE_UNUSED=true`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_event_type: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_role: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_registration_profile: Option<u64>,

    /// Delete records no occurrence claims instead of disabling them.
    #[serde(default)]
    pub delete_unused: bool,

    #[serde(default = "default_provider_timeout")]
    pub provider_timeout: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<Remote>,
}

impl Settings {
    pub fn config_path() -> CoreResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CoreError::Config("Could not determine config directory".into()))?
            .join("eosync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented default file first
    /// if there is none.
    pub fn load() -> CoreResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CoreResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("EOSYNC").try_parsing(true))
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn site(&self) -> Site {
        let full_path_str = shellexpand::tilde(&self.site_dir.to_string_lossy()).into_owned();
        Site::new(full_path_str)
    }

    pub fn record_defaults(&self) -> RecordDefaults {
        RecordDefaults {
            event_type: self.default_event_type,
            role: self.default_role,
            registration_profile: self.default_registration_profile,
        }
    }

    pub fn policy(&self) -> UnmatchedPolicy {
        if self.delete_unused {
            UnmatchedPolicy::Delete
        } else {
            UnmatchedPolicy::Disable
        }
    }

    pub fn provider_timeout(&self) -> CoreResult<Duration> {
        humantime::parse_duration(&self.provider_timeout).map_err(|e| {
            CoreError::Config(format!(
                "Invalid provider_timeout '{}': {e}",
                self.provider_timeout
            ))
        })
    }

    /// The configured remote, with the provider timeout applied.
    pub fn remote(&self) -> CoreResult<Remote> {
        let remote = self.remote.clone().ok_or(CoreError::NoRemoteConfigured)?;
        Ok(remote.with_timeout(self.provider_timeout()?))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CoreResult<()> {
        let contents = format!(
            "\
# eosync configuration

# Where local events and venues live:
# site_dir = \"{DEFAULT_SITE_DIR}\"

# Fallbacks for events that don't set their own:
# default_event_type = 1
# default_role = 1
# default_registration_profile = 12

# Delete CRM records no occurrence uses instead of disabling them:
# delete_unused = false

# How long to wait for the provider on each call:
# provider_timeout = \"{DEFAULT_PROVIDER_TIMEOUT}\"

# [remote]
# provider = \"civicrm\"
# civicrm_url = \"https://crm.example.org\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CoreError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_file_loads_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eosync/config.toml");
        Settings::create_default_config(&path).unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.site_dir, PathBuf::from(DEFAULT_SITE_DIR));
        assert_eq!(settings.policy(), UnmatchedPolicy::Disable);
        assert_eq!(settings.provider_timeout().unwrap(), Duration::from_secs(30));
        assert!(matches!(settings.remote(), Err(CoreError::NoRemoteConfigured)));
    }

    #[test]
    fn remote_section_carries_provider_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
site_dir = "/srv/site"
default_event_type = 3
delete_unused = true
provider_timeout = "1m"

[remote]
provider = "civicrm"
civicrm_url = "https://crm.example.org"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.record_defaults().event_type, Some(3));
        assert_eq!(settings.policy(), UnmatchedPolicy::Delete);
        assert_eq!(settings.site().dir(), Path::new("/srv/site"));
        let remote = settings.remote().unwrap();
        assert_eq!(remote.provider.name(), "civicrm");
        assert!(remote.config.0.contains_key("civicrm_url"));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "provider_timeout = \"soon\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(matches!(settings.provider_timeout(), Err(CoreError::Config(_))));
    }
}
