//! Configuration for the bridge host.
//!
//! Reads `config.toml` from the user config directory
//! (e.g. `~/.config/opfs-explorer/config.toml`); every field has a
//! default so a missing or partial file is fine.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9220,
            bind: "127.0.0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory served as the sandbox root. Defaults to
    /// `<data dir>/opfs-explorer/sandbox` when unset.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load from the default path, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from_path(&Self::default_config_path()).unwrap_or_default()
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("opfs-explorer")
            .join("config.toml")
    }

    pub fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unparseable config file");
                None
            }
        }
    }

    /// The sandbox directory to serve.
    pub fn sandbox_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("opfs-explorer")
                .join("sandbox")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 9220);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4321\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 4321);
        assert_eq!(config.server.bind, "127.0.0.1");
    }

    #[test]
    fn data_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/tmp/sandbox\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.sandbox_dir(), PathBuf::from("/tmp/sandbox"));
    }
}
