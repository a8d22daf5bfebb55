//! Audio input port interface

use std::sync::mpsc::SyncSender;

use thiserror::Error;

use crate::domain::audio::AudioChunk;
use crate::domain::device::{DeviceConfig, DeviceDescriptor};

/// Errors from device enumeration
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("Failed to enumerate audio devices: {0}")]
    EnumerationFailed(String),

    #[error("No such input device: {0}")]
    UnknownDevice(usize),
}

/// A probe that could not open or produced no buffers. Expected and
/// recoverable; drives the fallback search in the device resolver.
#[derive(Debug, Clone, Error)]
#[error("probe of device {device_id} at {channels}ch/{sample_rate}Hz failed: {reason}")]
pub struct ProbeFailure {
    pub device_id: usize,
    pub channels: u16,
    pub sample_rate: u32,
    pub reason: String,
}

/// Error opening a capture stream
#[derive(Debug, Clone, Error)]
#[error("Failed to open capture stream: {0}")]
pub struct CaptureStreamError(pub String);

/// Handle to a live input stream.
///
/// The backend keeps the underlying (non-`Send`) stream on its own thread;
/// the guard is `Send` and closing it releases the device and stops chunk
/// delivery. Dropping the sender side of the chunk queue signals a
/// mid-stream device failure to the capture worker.
pub trait StreamGuard: Send {
    fn close(self: Box<Self>);
}

/// Port for the audio capture backend
pub trait AudioInput: Send + Sync {
    /// Enumerate input-capable devices.
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError>;

    /// Short, disposable trial capture. Succeeds when the configuration
    /// opens without a hard I/O error and delivers at least one buffer;
    /// silence is acceptable. No audio is retained.
    fn probe(&self, device_id: usize, channels: u16, sample_rate: u32)
        -> Result<(), ProbeFailure>;

    /// Open a capture stream that delivers interleaved f32 chunks into the
    /// bounded queue until the guard is closed.
    fn open_stream(
        &self,
        config: &DeviceConfig,
        chunks: SyncSender<AudioChunk>,
    ) -> Result<Box<dyn StreamGuard>, CaptureStreamError>;
}
