//! Audio input device descriptors

use serde::{Deserialize, Serialize};

/// Name fragments that mark ALSA plugins and other virtual/loopback routing
/// layers. Anything matching is deprioritized during device discovery.
const VIRTUAL_NAME_FRAGMENTS: &[&str] = &[
    "sysdefault",
    "default",
    "samplerate",
    "speexrate",
    "upmix",
    "vdownmix",
    "null",
    "dummy",
    "loop",
];

/// An enumerated input device. Produced by the audio backend, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Enumeration index, stable for the lifetime of the backend host.
    pub id: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub default_sample_rate: u32,
    pub is_default: bool,
}

impl DeviceDescriptor {
    /// Whether this looks like a real hardware endpoint rather than a
    /// virtual/software routing layer, judged by name heuristics.
    pub fn is_hardware(&self) -> bool {
        let name = self.name.to_lowercase();
        !VIRTUAL_NAME_FRAGMENTS.iter().any(|frag| name.contains(frag))
    }

    /// One line of `LIST_DEVICES` output.
    pub fn format_line(&self, active: bool) -> String {
        let mut line = format!(
            "ID {}: {} (channels: {}, default sr: {}, default: {})",
            self.id, self.name, self.max_input_channels, self.default_sample_rate, self.is_default
        );
        if active {
            line.push_str(" [ACTIVE]");
        }
        line
    }
}

/// The negotiated capture configuration. Resolved once at startup or reload,
/// immutable while a session is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: usize,
    pub channels: u16,
    pub sample_rate: u32,
}
