//! Audio device resolution
//!
//! Probes available input devices and negotiates a working capture
//! configuration: hardware devices first at their native rate, then at the
//! model's 16 kHz target, with a single-channel last resort across every
//! device including virtual ones.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::ports::AudioInput;
use crate::domain::audio::TARGET_SAMPLE_RATE;
use crate::domain::device::DeviceConfig;

/// Channel count used for probing and normal capture.
const PROBE_CHANNELS: u16 = 2;

/// No device could be opened at all. Fatal at startup; at reload time the
/// caller keeps the previous working configuration.
#[derive(Debug, Clone, Error)]
#[error("No working audio input device found")]
pub struct NoWorkingDeviceError;

/// Result of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub device: DeviceConfig,
    /// True when a configured preferred device was rejected and
    /// auto-discovery picked a replacement; the caller persists the new id.
    pub discovered: bool,
}

/// Find a working input device configuration.
pub fn resolve<A: AudioInput + ?Sized>(
    audio: &A,
    preferred: Option<usize>,
) -> Result<Resolution, NoWorkingDeviceError> {
    let devices = audio.devices().map_err(|e| {
        warn!(error = %e, "device enumeration failed");
        NoWorkingDeviceError
    })?;

    if let Some(id) = preferred {
        match devices.iter().find(|d| d.id == id) {
            Some(descriptor) => {
                match audio.probe(id, PROBE_CHANNELS, descriptor.default_sample_rate) {
                    Ok(()) => {
                        info!(device = id, rate = descriptor.default_sample_rate,
                            "configured device is working");
                        return Ok(Resolution {
                            device: DeviceConfig {
                                device_id: id,
                                channels: PROBE_CHANNELS,
                                sample_rate: descriptor.default_sample_rate,
                            },
                            discovered: false,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "configured device failed, falling back to discovery")
                    }
                }
            }
            None => warn!(device = id, "configured device no longer enumerated"),
        }
    }

    let discovered = preferred.is_some();

    // Hardware devices first, at their native rate and then at the target
    // rate.
    let hardware: Vec<_> = devices.iter().filter(|d| d.is_hardware()).collect();
    info!(count = hardware.len(), "found hardware input devices");

    for descriptor in &hardware {
        for rate in [descriptor.default_sample_rate, TARGET_SAMPLE_RATE] {
            match audio.probe(descriptor.id, PROBE_CHANNELS, rate) {
                Ok(()) => {
                    info!(device = descriptor.id, rate, "found working hardware device");
                    return Ok(Resolution {
                        device: DeviceConfig {
                            device_id: descriptor.id,
                            channels: PROBE_CHANNELS,
                            sample_rate: rate,
                        },
                        discovered,
                    });
                }
                Err(e) => debug!(error = %e, "probe failed"),
            }
            if descriptor.default_sample_rate == TARGET_SAMPLE_RATE {
                break;
            }
        }
    }

    // Last resort: every device, hardware or virtual, mono at the target
    // rate.
    warn!("no hardware device working, trying all devices at 1ch/16kHz");
    for descriptor in &devices {
        match audio.probe(descriptor.id, 1, TARGET_SAMPLE_RATE) {
            Ok(()) => {
                info!(device = descriptor.id, "found working fallback device");
                return Ok(Resolution {
                    device: DeviceConfig {
                        device_id: descriptor.id,
                        channels: 1,
                        sample_rate: TARGET_SAMPLE_RATE,
                    },
                    discovered,
                });
            }
            Err(e) => debug!(error = %e, "probe failed"),
        }
    }

    Err(NoWorkingDeviceError)
}
