use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default filename used to persist configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

pub const ENV_DATA_DIR: &str = "MEDIDIR_DATA_DIR";
pub const ENV_SERVICE_HOST: &str = "MEDIDIR_SERVICE_HOST";
pub const ENV_SERVICE_PORT: &str = "MEDIDIR_SERVICE_PORT";

/// Where the HTTP service binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Lifetime of issued bearer tokens.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl AuthSettings {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours.clamp(1, 24 * 365))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    #[serde(default = "default_cache_capacity_mb")]
    pub cache_capacity_mb: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            cache_capacity_mb: default_cache_capacity_mb(),
        }
    }
}

impl StorageSettings {
    pub fn cache_capacity_bytes(&self) -> u64 {
        self.cache_capacity_mb.max(1).saturating_mul(1024 * 1024)
    }
}

/// Complete persisted configuration payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Applies `MEDIDIR_SERVICE_HOST` / `MEDIDIR_SERVICE_PORT` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(ENV_SERVICE_HOST) {
            let host = host.trim();
            if !host.is_empty() {
                self.server.host = host.to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_SERVICE_PORT) {
            match raw.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "ignoring invalid {ENV_SERVICE_PORT}")
                }
            }
        }
        self
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid bind address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}

/// Thread-safe manager responsible for loading and persisting `AppConfig`.
pub struct ConfigManager {
    path: PathBuf,
    state: RwLock<AppConfig>,
}

impl ConfigManager {
    /// Create a manager rooted at `data_dir`. The JSON file will be located at
    /// `<data_dir>/config.json` and is written with defaults on first run.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let existed = path.exists();
        let config = if existed {
            fs::read(&path)
                .ok()
                .and_then(|bytes| match serde_json::from_slice::<AppConfig>(&bytes) {
                    Ok(config) => Some(config),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "unreadable config, using defaults");
                        None
                    }
                })
                .unwrap_or_default()
        } else {
            AppConfig::default()
        };

        let manager = Self {
            path,
            state: RwLock::new(config),
        };
        if !existed {
            manager.persist_locked(&manager.state.read())?;
        }
        Ok(manager)
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> AppConfig {
        self.state.read().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the backing directory exists and write the JSON payload.
    fn persist_locked(&self, config: &AppConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, payload)
    }
}

/// `MEDIDIR_DATA_DIR` if set, otherwise the platform data directory.
pub fn resolve_data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(ENV_DATA_DIR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => directories::ProjectDirs::from("dev", "medidir", "Medidir")
            .ok_or_else(|| anyhow::anyhow!("unable to determine OS data dir"))?
            .data_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir)
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_token_ttl_hours() -> i64 {
    24
}

const fn default_cache_capacity_mb() -> u64 {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load(dir.path()).unwrap();

        assert_eq!(manager.current(), AppConfig::default());
        assert!(manager.path().exists());

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(manager.path()).unwrap()).unwrap();
        assert_eq!(raw["server"]["port"], 5000);
        assert_eq!(raw["auth"]["tokenTtlHours"], 24);
        assert_eq!(raw["storage"]["cacheCapacityMb"], 64);
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "server": { "port": 8080 } }"#,
        )
        .unwrap();

        let config = ConfigManager::load(dir.path()).unwrap().current();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_hours, 24);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), b"{ not json").unwrap();

        let config = ConfigManager::load(dir.path()).unwrap().current();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn derived_values() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:5000");
        assert_eq!(config.auth.token_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.storage.cache_capacity_bytes(), 64 * 1024 * 1024);

        let mut bad = AppConfig::default();
        bad.server.host = "not a host".into();
        assert!(bad.bind_addr().is_err());
    }
}
