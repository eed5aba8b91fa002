//! API credentials for CiviCRM sites.
//!
//! Stored per site profile at:
//!   ~/.config/eosync/providers/civicrm/credentials.toml
//!
//! ```toml
//! [default]
//! api_key = "..."
//! site_key = "..."
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::PROVIDER_NAME;

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("eosync")
        .join("providers")
        .join(PROVIDER_NAME))
}

/// The API user's key and the site key of the CiviCRM install.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub site_key: String,
}

impl Credentials {
    pub fn path() -> Result<PathBuf> {
        Ok(base_dir()?.join("credentials.toml"))
    }

    pub fn load(site: &str) -> Result<Self> {
        Self::load_from(&Self::path()?, site)
    }

    pub fn load_from(path: &Path, site: &str) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("CiviCRM credentials not found at {}", path.display());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        let mut sites: HashMap<String, Credentials> = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))?;

        sites
            .remove(site)
            .with_context(|| format!("No [{}] section in {}", site, path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_named_site() {
        let (_dir, path) = write(
            r#"
[default]
api_key = "a"
site_key = "b"

[staging]
api_key = "c"
site_key = "d"
"#,
        );

        let creds = Credentials::load_from(&path, "staging").unwrap();
        assert_eq!(creds.api_key, "c");
        assert_eq!(creds.site_key, "d");
    }

    #[test]
    fn missing_site_is_an_error() {
        let (_dir, path) = write("[default]\napi_key = \"a\"\nsite_key = \"b\"\n");

        let err = Credentials::load_from(&path, "main").unwrap_err();
        assert!(err.to_string().contains("[main]"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Credentials::load_from(&dir.path().join("nope.toml"), "default").is_err());
    }
}
