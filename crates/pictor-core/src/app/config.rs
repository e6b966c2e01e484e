//! ProviderConfig - JSON から読み込める設定
//!
//! `Default` だけで動くようにしておき、必要な項目だけ JSON で上書きします。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ports::DownloadOptions;

/// Longest signed URL lifetime accepted (7 days).
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Settings shared by the providers a process builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Passed verbatim to the downloader on every fetch.
    pub download: DownloadOptions,

    /// Lifetime the storage backend should give signed URLs.
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ProviderConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn signed_url_ttl(&self) -> chrono::Duration {
        let secs = self.signed_url_ttl_secs.min(MAX_SIGNED_URL_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.signed_url_ttl_secs == 0 || self.signed_url_ttl_secs > MAX_SIGNED_URL_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "signed_url_ttl_secs must be between 1 and {MAX_SIGNED_URL_TTL_SECS}"
            )));
        }
        if self.download.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "download.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            download: DownloadOptions::default(),
            signed_url_ttl_secs: 3600,
        }
    }
}
