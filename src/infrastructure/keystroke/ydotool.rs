//! Keystroke injection via the ydotool daemon

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{InjectionError, TextInjector};

/// Delay between injected keys, in milliseconds. Some toolkits drop events
/// when keys arrive back to back.
const KEY_DELAY_MS: &str = "4";

/// Injects text with `ydotool type`. Requires ydotoold to be running with
/// access to /dev/uinput.
pub struct YdotoolInjector;

impl YdotoolInjector {
    pub fn new() -> Self {
        Self
    }

    async fn run_type(&self, text: &str) -> Result<(), InjectionError> {
        let status = Command::new("ydotool")
            .args(["type", "--key-delay", KEY_DELAY_MS, "--", text])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => InjectionError::ToolNotFound("ydotool".to_string()),
                _ => InjectionError::TypeFailed(e.to_string()),
            })?;

        if !status.success() {
            return Err(InjectionError::TypeFailed(format!(
                "ydotool exited with {status}"
            )));
        }
        Ok(())
    }
}

impl Default for YdotoolInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextInjector for YdotoolInjector {
    async fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        if text.is_empty() {
            return Ok(());
        }

        debug!(chars = text.chars().count(), "injecting text");
        if !needs_char_fallback(text) {
            return self.run_type(text).await;
        }

        // ydotool mangles multi-byte sequences on some compositors when sent
        // as one argument; feed them one character at a time.
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.run_type(ch.encode_utf8(&mut buf)).await?;
        }
        Ok(())
    }
}

fn needs_char_fallback(text: &str) -> bool {
    !text.is_ascii()
}
