//! Local speech-to-text via whisper.cpp

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::application::ports::{Transcriber, TranscriptionError};
use crate::domain::audio::TARGET_SAMPLE_RATE;
use crate::domain::config::{ModelSize, Task, TranscribeRequest};

const MAX_THREADS: i32 = 8;

struct LoadedModel {
    model: ModelSize,
    context: WhisperContext,
}

/// Whisper transcriber loading ggml model files from a local directory.
///
/// The context is loaded lazily on first use and reloaded when a config
/// reload switches the model tier. Model files follow the upstream naming
/// scheme, `ggml-<size>.bin`.
pub struct WhisperTranscriber {
    models_dir: PathBuf,
    loaded: Mutex<Option<LoadedModel>>,
}

impl WhisperTranscriber {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            loaded: Mutex::new(None),
        }
    }

    /// `~/.cache/dictation/models`, or a temp-dir fallback when the cache
    /// directory cannot be determined.
    pub fn default_models_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("dictation")
            .join("models")
    }

    pub fn model_path(&self, model: ModelSize) -> PathBuf {
        self.models_dir.join(format!("ggml-{model}.bin"))
    }

    fn load_context(path: &Path) -> Result<WhisperContext, TranscriptionError> {
        if !path.exists() {
            return Err(TranscriptionError::ModelNotFound(
                path.display().to_string(),
            ));
        }
        let path_str = path.to_str().ok_or_else(|| {
            TranscriptionError::ModelInit(format!("non-UTF8 model path: {}", path.display()))
        })?;

        info!(model = %path.display(), "loading whisper model");
        WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| TranscriptionError::ModelInit(e.to_string()))
    }

    fn threads() -> i32 {
        (std::thread::available_parallelism()
            .map(|n| n.get() as i32)
            .unwrap_or(4))
        .min(MAX_THREADS)
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        request: &TranscribeRequest,
    ) -> Result<String, TranscriptionError> {
        if sample_rate != TARGET_SAMPLE_RATE {
            return Err(TranscriptionError::Inference(format!(
                "expected {TARGET_SAMPLE_RATE} Hz input, got {sample_rate}"
            )));
        }

        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let needs_reload = !matches!(&*loaded, Some(l) if l.model == request.model);
        if needs_reload {
            let context = Self::load_context(&self.model_path(request.model))?;
            *loaded = Some(LoadedModel {
                model: request.model,
                context,
            });
        }

        let Some(current) = loaded.as_ref() else {
            return Err(TranscriptionError::ModelInit("model slot empty".into()));
        };

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(request.language.as_str()));
        params.set_translate(request.task == Task::Translate);
        params.set_n_threads(Self::threads());
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = current
            .context
            .create_state()
            .map_err(|e| TranscriptionError::ModelInit(e.to_string()))?;

        debug!(samples = samples.len(), language = %request.language, "running inference");
        state
            .full(params, samples)
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| TranscriptionError::Inference(e.to_string()))?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}
