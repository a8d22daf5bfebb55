//! Transcription port interface

use thiserror::Error;

use crate::domain::config::TranscribeRequest;

/// Transcription errors
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model initialisation failed: {0}")]
    ModelInit(String),

    #[error("Transcription failed: {0}")]
    Inference(String),
}

/// Port for speech-to-text.
///
/// Blocking and CPU-bound; the service always invokes it through
/// `spawn_blocking`, never on the command-accept path. The request carries
/// the model/language/task settings so a config reload takes effect on the
/// next call.
pub trait Transcriber: Send + Sync {
    /// Transcribe mono f32 PCM samples at `sample_rate` into text.
    fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        request: &TranscribeRequest,
    ) -> Result<String, TranscriptionError>;
}

/// Blanket implementation for shared transcriber handles
impl<T: Transcriber + ?Sized> Transcriber for std::sync::Arc<T> {
    fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        request: &TranscribeRequest,
    ) -> Result<String, TranscriptionError> {
        self.as_ref().transcribe(samples, sample_rate, request)
    }
}
