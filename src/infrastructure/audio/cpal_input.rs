//! Cross-platform audio capture backend using cpal
//!
//! cpal streams are not `Send`, so every open stream lives on a dedicated
//! thread owned by this adapter; the [`StreamGuard`] handed back to the
//! capture worker only carries the stop flag and the thread handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tracing::{debug, warn};

use crate::application::ports::{
    AudioError, AudioInput, CaptureStreamError, ProbeFailure, StreamGuard,
};
use crate::domain::audio::AudioChunk;
use crate::domain::device::{DeviceConfig, DeviceDescriptor};

/// Length of the disposable trial capture used by probes.
const PROBE_WINDOW: Duration = Duration::from_millis(150);

/// How long to wait for the stream thread to report an open result.
const OPEN_TIMEOUT: Duration = Duration::from_secs(3);

/// cpal-backed [`AudioInput`]. Stateless; device ids are enumeration
/// positions within the host's input device list.
pub struct CpalAudioInput;

impl CpalAudioInput {
    pub fn new() -> Self {
        Self
    }

    fn device_by_id(device_id: usize) -> Result<cpal::Device, String> {
        let host = cpal::default_host();
        host.input_devices()
            .map_err(|e| format!("failed to enumerate devices: {e}"))?
            .nth(device_id)
            .ok_or_else(|| format!("no input device with id {device_id}"))
    }

    /// Build an input stream delivering f32 samples regardless of the
    /// device's native format. Only i16 and f32 devices are supported.
    fn build_stream<D, E>(
        device: &cpal::Device,
        config: &StreamConfig,
        format: SampleFormat,
        on_data: D,
        on_error: E,
    ) -> Result<cpal::Stream, String>
    where
        D: Fn(&[f32]) + Send + 'static,
        E: Fn(cpal::StreamError) + Send + 'static,
    {
        match format {
            SampleFormat::F32 => device
                .build_input_stream(
                    config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| on_data(data),
                    on_error,
                    None,
                )
                .map_err(|e| e.to_string()),
            SampleFormat::I16 => device
                .build_input_stream(
                    config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        on_data(&converted);
                    },
                    on_error,
                    None,
                )
                .map_err(|e| e.to_string()),
            other => Err(format!("unsupported sample format: {other:?}")),
        }
    }
}

impl Default for CpalAudioInput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioInput for CpalAudioInput {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok());

        let mut descriptors = Vec::new();
        let devices = host
            .input_devices()
            .map_err(|e| AudioError::EnumerationFailed(e.to_string()))?;

        for (id, device) in devices.enumerate() {
            let name = device.name().unwrap_or_else(|_| format!("device-{id}"));
            let default_config = match device.default_input_config() {
                Ok(config) => config,
                Err(e) => {
                    debug!(device = %name, error = %e, "skipping unqueryable device");
                    continue;
                }
            };

            let max_channels = device
                .supported_input_configs()
                .map(|configs| {
                    configs
                        .map(|c| c.channels())
                        .max()
                        .unwrap_or_else(|| default_config.channels())
                })
                .unwrap_or_else(|_| default_config.channels());

            descriptors.push(DeviceDescriptor {
                id,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                max_input_channels: max_channels,
                default_sample_rate: default_config.sample_rate().0,
            });
        }

        Ok(descriptors)
    }

    fn probe(
        &self,
        device_id: usize,
        channels: u16,
        sample_rate: u32,
    ) -> Result<(), ProbeFailure> {
        let fail = |reason: String| ProbeFailure {
            device_id,
            channels,
            sample_rate,
            reason,
        };

        let device = Self::device_by_id(device_id).map_err(fail)?;
        let format = device
            .default_input_config()
            .map(|c| c.sample_format())
            .map_err(|e| fail(e.to_string()))?;

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let got_buffer = Arc::new(AtomicBool::new(false));
        let errored = Arc::new(AtomicBool::new(false));

        let got = Arc::clone(&got_buffer);
        let err = Arc::clone(&errored);
        let stream = Self::build_stream(
            &device,
            &config,
            format,
            move |_data| got.store(true, Ordering::SeqCst),
            move |e| {
                warn!(error = %e, "stream error during probe");
                err.store(true, Ordering::SeqCst);
            },
        )
        .map_err(fail)?;

        stream.play().map_err(|e| fail(e.to_string()))?;
        std::thread::sleep(PROBE_WINDOW);
        drop(stream);

        if errored.load(Ordering::SeqCst) {
            return Err(fail("stream error during probe".into()));
        }
        if !got_buffer.load(Ordering::SeqCst) {
            return Err(fail("no buffers delivered".into()));
        }
        Ok(())
    }

    fn open_stream(
        &self,
        config: &DeviceConfig,
        chunks: SyncSender<AudioChunk>,
    ) -> Result<Box<dyn StreamGuard>, CaptureStreamError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let config = *config;

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

        let thread = std::thread::Builder::new()
            .name("cpal-stream".into())
            .spawn(move || {
                let errored = Arc::new(AtomicBool::new(false));

                let open = || -> Result<cpal::Stream, String> {
                    let device = Self::device_by_id(config.device_id)?;
                    let format = device
                        .default_input_config()
                        .map(|c| c.sample_format())
                        .map_err(|e| e.to_string())?;

                    let stream_config = StreamConfig {
                        channels: config.channels,
                        sample_rate: SampleRate(config.sample_rate),
                        buffer_size: cpal::BufferSize::Default,
                    };

                    let err = Arc::clone(&errored);
                    let stream = Self::build_stream(
                        &device,
                        &stream_config,
                        format,
                        move |data| {
                            // Bounded queue: drop the chunk on backpressure
                            // rather than blocking the realtime callback.
                            let _ = chunks.try_send(AudioChunk::new(data.to_vec()));
                        },
                        move |e| {
                            warn!(error = %e, "capture stream error");
                            err.store(true, Ordering::SeqCst);
                        },
                    )?;
                    stream.play().map_err(|e| e.to_string())?;
                    Ok(stream)
                };

                match open() {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while !stop_flag.load(Ordering::SeqCst)
                            && !errored.load(Ordering::SeqCst)
                        {
                            std::thread::sleep(Duration::from_millis(50));
                        }
                        drop(stream);
                        // Dropping the stream drops the chunk sender; a
                        // worker that wasn't asked to stop reads that as a
                        // device failure.
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| CaptureStreamError(format!("failed to spawn stream thread: {e}")))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(CpalStreamGuard {
                stop,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(CaptureStreamError(e))
            }
            Err(_) => {
                stop.store(true, Ordering::SeqCst);
                Err(CaptureStreamError("timed out opening capture stream".into()))
            }
        }
    }
}

struct CpalStreamGuard {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StreamGuard for CpalStreamGuard {
    fn close(mut self: Box<Self>) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CpalStreamGuard {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
