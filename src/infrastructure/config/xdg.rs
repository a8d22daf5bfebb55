//! XDG-compliant configuration storage

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

const APP_DIR: &str = "dictation";
const CONFIG_FILE: &str = "config.toml";

/// Stores configuration in `$XDG_CONFIG_HOME/dictation/config.toml`.
pub struct XdgConfigStore {
    config_path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            config_path: config_dir.join(CONFIG_FILE),
        }
    }

    /// Create a store with a custom path (useful for testing)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            debug!(path = %self.config_path.display(), "config file missing, using defaults");
            return Ok(AppConfig::defaults());
        }

        let content = tokio::fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        tokio::fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn path(&self) -> PathBuf {
        self.config_path.clone()
    }

    fn exists(&self) -> bool {
        self.config_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, XdgConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        (dir, store)
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let (_dir, store) = store();
        assert!(!store.exists());

        let config = store.load().await.unwrap();
        assert_eq!(config, AppConfig::defaults());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let (_dir, store) = store();

        let mut config = AppConfig::defaults();
        config.audio_device = Some(3);
        config.model = Some("small".to_string());
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.audio_device, Some(3));
        assert_eq!(loaded.model.as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn unknown_keys_survive_save() {
        let (_dir, store) = store();

        tokio::fs::write(
            store.path(),
            "model = \"base\"\nui_scale = 2\ntheme = \"dark\"\n",
        )
        .await
        .unwrap();

        let mut config = store.load().await.unwrap();
        config.audio_device = Some(1);
        store.save(&config).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains("ui_scale"));
        assert!(raw.contains("theme"));
        assert!(raw.contains("audio_device"));
    }

    #[tokio::test]
    async fn malformed_toml_is_a_parse_error() {
        let (_dir, store) = store();
        tokio::fs::write(store.path(), "model = [not toml").await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("nested").join("config.toml"));

        store.save(&AppConfig::defaults()).await.unwrap();
        assert!(store.exists());
    }
}
