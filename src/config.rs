use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::client::PorkbunClient;
use crate::constants::API_ENDPOINT;
use crate::error::{Error, Result};

/// Settings from the command line, the environment or a TOML file.
///
/// Every field is optional so that sources can be layered with [`Settings::or`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub api_key: Option<String>,
    pub secret_api_key: Option<String>,
    pub endpoint: Option<String>,
    pub backup_dir: Option<PathBuf>,
}

impl Settings {
    pub fn parse(raw: &str) -> Result<Self> {
        let deserializer = toml::Deserializer::new(raw);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            Error::Config(format!(
                "TOML parse error at '{}': {}",
                e.path(),
                e.inner().message()
            ))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            api_key: self.api_key.or(fallback.api_key),
            secret_api_key: self.secret_api_key.or(fallback.secret_api_key),
            endpoint: self.endpoint.or(fallback.endpoint),
            backup_dir: self.backup_dir.or(fallback.backup_dir),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(API_ENDPOINT)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Builds the provider client; both API keys must be set.
    pub fn client(&self) -> Result<PorkbunClient> {
        let api_key = non_empty(self.api_key.as_deref())
            .ok_or_else(|| Error::Config("API key is not set (--key or PKB_API_KEY)".into()))?;
        let secret = non_empty(self.secret_api_key.as_deref()).ok_or_else(|| {
            Error::Config("API secret is not set (--secret or PKB_API_SECRET)".into())
        })?;
        Ok(PorkbunClient::new(self.endpoint(), api_key, secret))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
