//! Audio capture adapters

pub mod cpal_input;
pub mod wav_dump;

pub use cpal_input::CpalAudioInput;
pub use wav_dump::write_debug_wav;
