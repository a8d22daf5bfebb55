//! The dictation service: one session, serialized transitions, and the
//! command dispatch the socket server calls into.
//!
//! All state-transition bookkeeping happens under a single mutex with short
//! critical sections; stream opens, worker joins, transcription, injection,
//! and notification sends all run outside it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::capture::{CaptureOutcome, CaptureWorker};
use crate::application::ports::{
    AudioInput, ConfigStore, StatusSink, TextInjector, Transcriber, TranscriptionError,
};
use crate::application::resolver;
use crate::domain::audio::{
    concat_chunks, downmix_to_mono, normalize_peak, resample, AudioChunk, ResampleError,
    TARGET_SAMPLE_RATE,
};
use crate::domain::config::TranscribeRequest;
use crate::domain::device::DeviceConfig;
use crate::domain::protocol::{Command, Notification};
use crate::domain::session::{Session, SessionState};
use crate::infrastructure::audio::write_debug_wav;

/// Response frames for outcomes without payload.
pub const RESP_RECORDING_STARTED: &str = "RECORDING_STARTED";
pub const RESP_RECORDING_DISCARDED: &str = "RECORDING_DISCARDED";
pub const RESP_NOT_RECORDING: &str = "NOT_RECORDING";
pub const RESP_RELOAD_OK: &str = "Configuration reloaded successfully";

/// How often the monitor checks a live recording for a dead worker.
const MONITOR_INTERVAL: Duration = Duration::from_millis(200);

/// Something the socket server can dispatch decoded commands to.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle one command and produce the single response frame.
    async fn handle_command(&self, command: Command) -> String;
}

#[derive(Debug, Error)]
enum ProcessingError {
    #[error(transparent)]
    Resample(#[from] ResampleError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

/// Session bookkeeping guarded by the service mutex.
struct Slot {
    session: Session,
    worker: Option<CaptureWorker>,
    /// Incremented per recording; lets the failure monitor tell "my"
    /// recording apart from a later one.
    epoch: u64,
}

enum ToggleAction {
    Start(u64),
    Stop(Option<CaptureWorker>),
    Busy(String),
}

/// The daemon use case, generic over its ports.
pub struct DictationService<A, T, K, N, C> {
    audio: Arc<A>,
    transcriber: Arc<T>,
    injector: K,
    status: Arc<N>,
    config_store: C,
    slot: Arc<Mutex<Slot>>,
    device: RwLock<DeviceConfig>,
    settings: RwLock<TranscribeRequest>,
    /// Where the last processed take is dumped for diagnostics, if anywhere.
    debug_wav: Option<PathBuf>,
}

impl<A, T, K, N, C> DictationService<A, T, K, N, C>
where
    A: AudioInput + 'static,
    T: Transcriber + 'static,
    K: TextInjector,
    N: StatusSink + 'static,
    C: ConfigStore,
{
    pub fn new(
        audio: A,
        transcriber: T,
        injector: K,
        status: N,
        config_store: C,
        device: DeviceConfig,
        settings: TranscribeRequest,
        debug_wav: Option<PathBuf>,
    ) -> Self {
        Self {
            audio: Arc::new(audio),
            transcriber: Arc::new(transcriber),
            injector,
            status: Arc::new(status),
            config_store,
            slot: Arc::new(Mutex::new(Slot {
                session: Session::new(),
                worker: None,
                epoch: 0,
            })),
            device: RwLock::new(device),
            settings: RwLock::new(settings),
            debug_wav,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lock_slot().session.state()
    }

    /// Currently resolved capture configuration.
    pub fn device_config(&self) -> DeviceConfig {
        *self.device.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Dispatch one decoded command.
    pub async fn handle(&self, command: Command) -> String {
        debug!(command = %command, "dispatching");
        match command {
            Command::Toggle => self.toggle().await,
            Command::Discard => self.discard().await,
            Command::ListDevices => self.list_devices().await,
            Command::ReloadConfig => self.reload_config().await,
        }
    }

    /// Graceful shutdown: drop any in-flight recording and tell the
    /// indicator to exit.
    pub async fn shutdown(&self) {
        if self.state() == SessionState::Recording {
            let _ = self.discard().await;
        }
        self.notify(Notification::Quit).await;
    }

    async fn toggle(&self) -> String {
        let action = {
            let mut slot = self.lock_slot();
            match slot.session.state() {
                SessionState::Idle => {
                    // Optimistic transition; reverted if the stream open
                    // fails.
                    let _ = slot.session.start_recording();
                    slot.epoch += 1;
                    ToggleAction::Start(slot.epoch)
                }
                SessionState::Recording => {
                    let _ = slot.session.stop_recording();
                    ToggleAction::Stop(slot.worker.take())
                }
                SessionState::Processing => {
                    ToggleAction::Busy("BUSY: still processing, try again".to_string())
                }
            }
        };

        match action {
            ToggleAction::Start(epoch) => self.start_recording(epoch).await,
            ToggleAction::Stop(worker) => self.stop_and_transcribe(worker).await,
            ToggleAction::Busy(resp) => resp,
        }
    }

    async fn start_recording(&self, epoch: u64) -> String {
        let device = self.device_config();
        let audio = Arc::clone(&self.audio);
        let spawned =
            tokio::task::spawn_blocking(move || CaptureWorker::spawn(audio.as_ref(), &device))
                .await;

        let worker = match spawned {
            Ok(Ok(worker)) => worker,
            Ok(Err(e)) => {
                error!(error = %e, "failed to open capture stream");
                self.revert_start(epoch);
                return format!("ERROR: {e}");
            }
            Err(e) => {
                error!(error = %e, "capture spawn task failed");
                self.revert_start(epoch);
                return "ERROR: failed to start capture".to_string();
            }
        };

        let cancelled = {
            let mut slot = self.lock_slot();
            if slot.session.is_recording() && slot.epoch == epoch {
                slot.worker = Some(worker);
                None
            } else {
                // A discard won the race against the stream open.
                Some(worker)
            }
        };
        if let Some(worker) = cancelled {
            warn!("recording cancelled while the stream was opening");
            let _ = tokio::task::spawn_blocking(move || worker.stop()).await;
            return RESP_RECORDING_DISCARDED.to_string();
        }

        self.spawn_capture_monitor(epoch);
        self.notify(Notification::RecordingStarted).await;
        info!(device = device.device_id, rate = device.sample_rate, "recording started");
        RESP_RECORDING_STARTED.to_string()
    }

    fn revert_start(&self, epoch: u64) {
        let mut slot = self.lock_slot();
        if slot.session.is_recording() && slot.epoch == epoch {
            let _ = slot.session.abort_recording();
        }
    }

    async fn stop_and_transcribe(&self, worker: Option<CaptureWorker>) -> String {
        let outcome = self.join_worker(worker).await;
        if outcome.stream_failed {
            warn!("capture stream failed mid-recording; transcribing what was collected");
        }
        self.notify(Notification::RecordingStopped).await;

        let device = self.device_config();
        let text = self.process_audio(outcome.chunks, device).await;
        self.notify(Notification::Processed(Some(text.clone()))).await;

        if !text.is_empty() {
            // Trailing space so consecutive dictations don't run together
            if let Err(e) = self.injector.type_text(&format!("{text} ")).await {
                warn!(error = %e, "keystroke injection failed, handing off to indicator");
                self.notify(Notification::Type(format!("{text} "))).await;
            }
        }

        {
            let mut slot = self.lock_slot();
            let _ = slot.session.complete_processing();
        }
        info!(chars = text.len(), "processing complete");
        Notification::Processed(Some(text)).frame()
    }

    async fn discard(&self) -> String {
        let worker = {
            let mut slot = self.lock_slot();
            match slot.session.state() {
                SessionState::Idle => return RESP_NOT_RECORDING.to_string(),
                SessionState::Recording => {
                    // Pass through processing so a concurrent command sees a
                    // consistent busy state during the join.
                    let _ = slot.session.stop_recording();
                    slot.worker.take()
                }
                SessionState::Processing => {
                    return "BUSY: still processing, try again".to_string()
                }
            }
        };

        let _ = self.join_worker(worker).await;
        // Neutral notification so the indicator returns to idle
        self.notify(Notification::Processed(None)).await;

        {
            let mut slot = self.lock_slot();
            let _ = slot.session.complete_processing();
        }
        info!("recording discarded");
        RESP_RECORDING_DISCARDED.to_string()
    }

    async fn list_devices(&self) -> String {
        let audio = Arc::clone(&self.audio);
        let devices = match tokio::task::spawn_blocking(move || audio.devices()).await {
            Ok(Ok(devices)) => devices,
            Ok(Err(e)) => {
                error!(error = %e, "device enumeration failed");
                return format!("ERROR: {e}");
            }
            Err(e) => {
                error!(error = %e, "device enumeration task failed");
                return "ERROR: failed to enumerate audio devices".to_string();
            }
        };

        if devices.is_empty() {
            return "No input devices found".to_string();
        }

        let active = self.device_config().device_id;
        devices
            .iter()
            .map(|d| d.format_line(d.id == active))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn reload_config(&self) -> String {
        {
            let mut slot = self.lock_slot();
            if let Err(e) = slot.session.begin_maintenance() {
                return format!("BUSY: {e}");
            }
        }

        let result = self.reload_inner().await;

        {
            let mut slot = self.lock_slot();
            let _ = slot.session.complete_processing();
        }

        match result {
            Ok(()) => {
                self.notify(Notification::ConfigChanged).await;
                RESP_RELOAD_OK.to_string()
            }
            Err(message) => {
                error!(error = %message, "configuration reload failed");
                format!("Error reloading configuration: {message}")
            }
        }
    }

    /// Re-run config load, device resolution, and model selection. On
    /// failure the previous working configuration stays in place.
    async fn reload_inner(&self) -> Result<(), String> {
        let config = self
            .config_store
            .load()
            .await
            .map_err(|e| e.to_string())?;

        let preferred = config.audio_device;
        let audio = Arc::clone(&self.audio);
        let resolution =
            tokio::task::spawn_blocking(move || resolver::resolve(audio.as_ref(), preferred))
                .await
                .map_err(|e| e.to_string())?
                .map_err(|e| e.to_string())?;

        *self.device.write().unwrap_or_else(|e| e.into_inner()) = resolution.device;
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = config.transcribe_request();

        if config.audio_device != Some(resolution.device.device_id) {
            let mut updated = config;
            updated.audio_device = Some(resolution.device.device_id);
            if let Err(e) = self.config_store.save(&updated).await {
                warn!(error = %e, "failed to persist discovered device id");
            }
        }

        info!(
            device = resolution.device.device_id,
            rate = resolution.device.sample_rate,
            "configuration reloaded"
        );
        Ok(())
    }

    /// Bounded join: the worker thread re-checks its stop flag every poll
    /// interval, so this returns promptly.
    async fn join_worker(&self, worker: Option<CaptureWorker>) -> CaptureOutcome {
        match worker {
            Some(worker) => tokio::task::spawn_blocking(move || worker.stop())
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "capture worker join failed");
                    CaptureOutcome::default()
                }),
            None => CaptureOutcome::default(),
        }
    }

    /// Down-mix, normalize, dump the debug WAV, resample, transcribe.
    /// Failures degrade to empty text; zero captured chunks are not an
    /// error.
    async fn process_audio(&self, chunks: Vec<AudioChunk>, device: DeviceConfig) -> String {
        if chunks.is_empty() {
            warn!("no audio data collected");
            return String::new();
        }

        let request = self
            .settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let transcriber = Arc::clone(&self.transcriber);
        let debug_wav = self.debug_wav.clone();

        let result = tokio::task::spawn_blocking(move || -> Result<String, ProcessingError> {
            let samples = concat_chunks(&chunks);
            let mut mono = downmix_to_mono(&samples, device.channels);
            normalize_peak(&mut mono);

            if let Some(path) = debug_wav {
                match write_debug_wav(&path, &mono, device.sample_rate) {
                    Ok(()) => debug!(path = %path.display(), "saved debug recording"),
                    Err(e) => debug!(error = %e, "debug recording dump failed"),
                }
            }

            if mono.is_empty() {
                return Ok(String::new());
            }

            let mono = resample(&mono, device.sample_rate, TARGET_SAMPLE_RATE)?;
            let text = transcriber.transcribe(&mono, TARGET_SAMPLE_RATE, &request)?;
            Ok(text)
        })
        .await;

        match result {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => {
                error!(error = %e, "audio processing failed");
                String::new()
            }
            Err(e) => {
                error!(error = %e, "audio processing task failed");
                String::new()
            }
        }
    }

    /// Watch a live recording for a worker that died without a stop request
    /// and return the session to idle when it does.
    fn spawn_capture_monitor(&self, epoch: u64) {
        let slot = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MONITOR_INTERVAL);
            loop {
                ticker.tick().await;

                let worker = {
                    let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
                    if guard.epoch != epoch || !guard.session.is_recording() {
                        return;
                    }
                    let finished = guard
                        .worker
                        .as_ref()
                        .map(|w| w.is_finished())
                        .unwrap_or(false);
                    if !finished {
                        continue;
                    }
                    let worker = guard.worker.take();
                    let _ = guard.session.abort_recording();
                    worker
                };

                error!("capture stream failed mid-recording, returning to idle");
                if let Some(worker) = worker {
                    let _ = tokio::task::spawn_blocking(move || worker.stop()).await;
                }
                for event in [Notification::RecordingStopped, Notification::Processed(None)] {
                    if let Err(e) = status.notify(&event).await {
                        warn!(event = %event.frame(), error = %e, "status notification failed");
                    }
                }
                return;
            }
        });
    }

    async fn notify(&self, event: Notification) {
        if let Err(e) = self.status.notify(&event).await {
            warn!(event = %event.frame(), error = %e, "status notification failed");
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<A, T, K, N, C> CommandHandler for DictationService<A, T, K, N, C>
where
    A: AudioInput + 'static,
    T: Transcriber + 'static,
    K: TextInjector,
    N: StatusSink + 'static,
    C: ConfigStore,
{
    async fn handle_command(&self, command: Command) -> String {
        self.handle(command).await
    }
}
