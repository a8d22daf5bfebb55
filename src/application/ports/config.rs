//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    /// Returns defaults if the file does not exist.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Save configuration to storage, preserving unknown keys.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Get the configuration file path.
    fn path(&self) -> PathBuf;

    /// Check if the configuration file exists.
    fn exists(&self) -> bool;
}

/// Blanket implementation for shared config store handles
#[async_trait]
impl<T: ConfigStore + ?Sized> ConfigStore for std::sync::Arc<T> {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        self.as_ref().load().await
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.as_ref().save(config).await
    }

    fn path(&self) -> PathBuf {
        self.as_ref().path()
    }

    fn exists(&self) -> bool {
        self.as_ref().exists()
    }
}
