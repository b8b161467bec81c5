//! Transport settings for the inventory client
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_API_VERSION: &str = "1.4.1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_version: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Setting this to false accepts invalid TLS certificates.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }
}

impl ClientConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoints are joined onto this url, so it always ends with a slash.
    pub fn base_url(&self) -> Result<Url> {
        let raw = match &self.base_url {
            Some(url) => url.clone(),
            None => format!(
                "https://earthexplorer.usgs.gov/inventory/json/v/{}/",
                self.api_version
            ),
        };
        let raw = if raw.ends_with('/') { raw } else { format!("{raw}/") };
        Ok(Url::parse(&raw)?)
    }
}
