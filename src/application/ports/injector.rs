//! Keystroke injection port interface

use async_trait::async_trait;
use thiserror::Error;

/// Injection errors
#[derive(Debug, Clone, Error)]
pub enum InjectionError {
    #[error("{0} not found. Please install it.")]
    ToolNotFound(String),

    #[error("Failed to type text: {0}")]
    TypeFailed(String),
}

/// Port for typing text into the currently focused window.
#[async_trait]
pub trait TextInjector: Send + Sync {
    /// Best-effort: the daemon logs failures and carries on.
    async fn type_text(&self, text: &str) -> Result<(), InjectionError>;
}

/// Blanket implementation for boxed injector types
#[async_trait]
impl TextInjector for Box<dyn TextInjector> {
    async fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        self.as_ref().type_text(text).await
    }
}

/// Blanket implementation for shared injector handles
#[async_trait]
impl<T: TextInjector + ?Sized> TextInjector for std::sync::Arc<T> {
    async fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        self.as_ref().type_text(text).await
    }
}
