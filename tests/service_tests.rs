//! End-to-end tests for the dictation service with mocked adapters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dictation::application::ports::{
    AudioError, AudioInput, CaptureStreamError, ConfigStore, InjectionError, NotifyError,
    ProbeFailure, StatusSink, StreamGuard, TextInjector, Transcriber, TranscriptionError,
};
use dictation::application::DictationService;
use dictation::domain::config::{AppConfig, ModelSize, TranscribeRequest};
use dictation::domain::device::{DeviceConfig, DeviceDescriptor};
use dictation::domain::protocol::{Command, Notification};
use dictation::domain::session::SessionState;

struct MockGuard {
    closed: Arc<AtomicBool>,
}

impl StreamGuard for MockGuard {
    fn close(self: Box<Self>) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Backend that emits a fixed number of chunks per recording, then either
/// idles until the stream is closed or drops the chunk sender to simulate
/// the device dying mid-recording.
struct MockAudio {
    devices: Vec<DeviceDescriptor>,
    chunks_per_recording: usize,
    die_after_chunks: bool,
}

impl MockAudio {
    fn new(chunks_per_recording: usize) -> Self {
        Self {
            devices: vec![
                DeviceDescriptor {
                    id: 0,
                    name: "USB Mic".to_string(),
                    max_input_channels: 2,
                    default_sample_rate: 16_000,
                    is_default: true,
                },
                DeviceDescriptor {
                    id: 1,
                    name: "HDA Intel".to_string(),
                    max_input_channels: 2,
                    default_sample_rate: 48_000,
                    is_default: false,
                },
            ],
            chunks_per_recording,
            die_after_chunks: false,
        }
    }

    fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    fn dying_mid_stream(mut self) -> Self {
        self.die_after_chunks = true;
        self
    }
}

impl AudioInput for MockAudio {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError> {
        Ok(self.devices.clone())
    }

    fn probe(&self, _: usize, _: u16, _: u32) -> Result<(), ProbeFailure> {
        Ok(())
    }

    fn open_stream(
        &self,
        _config: &DeviceConfig,
        chunks: SyncSender<dictation::domain::audio::AudioChunk>,
    ) -> Result<Box<dyn StreamGuard>, CaptureStreamError> {
        let closed = Arc::new(AtomicBool::new(false));
        let closed_flag = Arc::clone(&closed);
        let count = self.chunks_per_recording;
        let die = self.die_after_chunks;
        std::thread::spawn(move || {
            for _ in 0..count {
                let chunk = dictation::domain::audio::AudioChunk::new(vec![0.1; 320]);
                if chunks.send(chunk).is_err() {
                    return;
                }
            }
            if die {
                return; // drops the sender without a stop: device death
            }
            while !closed_flag.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
        });
        Ok(Box::new(MockGuard { closed }))
    }
}

/// Transcriber returning fixed text and recording every request it sees.
struct MockTranscriber {
    text: String,
    requests: Mutex<Vec<TranscribeRequest>>,
}

impl MockTranscriber {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        request: &TranscribeRequest,
    ) -> Result<String, TranscriptionError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.text.clone())
    }
}

/// Transcriber that blocks until released, holding the session in
/// Processing so concurrent commands can collide with it.
struct GatedTranscriber {
    gate: Mutex<std::sync::mpsc::Receiver<()>>,
    calls: Mutex<usize>,
}

impl GatedTranscriber {
    fn new() -> (Self, std::sync::mpsc::Sender<()>) {
        let (release, gate) = std::sync::mpsc::channel();
        (
            Self {
                gate: Mutex::new(gate),
                calls: Mutex::new(0),
            },
            release,
        )
    }
}

impl Transcriber for GatedTranscriber {
    fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        _request: &TranscribeRequest,
    ) -> Result<String, TranscriptionError> {
        *self.calls.lock().unwrap() += 1;
        let _ = self
            .gate
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5));
        Ok("hello world".to_string())
    }
}

#[derive(Default)]
struct MockInjector {
    typed: Mutex<Vec<String>>,
    fail: bool,
}

impl MockInjector {
    fn failing() -> Self {
        Self {
            typed: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl TextInjector for MockInjector {
    async fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        if self.fail {
            return Err(InjectionError::ToolNotFound("ydotool".to_string()));
        }
        self.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MockSink {
    frames: Mutex<Vec<String>>,
}

#[async_trait]
impl StatusSink for MockSink {
    async fn notify(&self, event: &Notification) -> Result<(), NotifyError> {
        self.frames.lock().unwrap().push(event.frame());
        Ok(())
    }
}

struct MockConfigStore {
    config: Mutex<AppConfig>,
    saved: Mutex<Vec<AppConfig>>,
}

impl MockConfigStore {
    fn new(config: AppConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn load(&self) -> Result<AppConfig, dictation::domain::error::ConfigError> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save(
        &self,
        config: &AppConfig,
    ) -> Result<(), dictation::domain::error::ConfigError> {
        self.saved.lock().unwrap().push(config.clone());
        *self.config.lock().unwrap() = config.clone();
        Ok(())
    }

    fn path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from("/nonexistent/config.toml")
    }

    fn exists(&self) -> bool {
        false
    }
}

struct Harness {
    service: DictationService<
        MockAudio,
        Arc<MockTranscriber>,
        Arc<MockInjector>,
        Arc<MockSink>,
        Arc<MockConfigStore>,
    >,
    transcriber: Arc<MockTranscriber>,
    injector: Arc<MockInjector>,
    sink: Arc<MockSink>,
    config_store: Arc<MockConfigStore>,
}

fn harness(audio: MockAudio, config: AppConfig) -> Harness {
    harness_with_injector(audio, config, MockInjector::default())
}

fn harness_with_injector(audio: MockAudio, config: AppConfig, injector: MockInjector) -> Harness {
    let transcriber = Arc::new(MockTranscriber::new("hello world"));
    let injector = Arc::new(injector);
    let sink = Arc::new(MockSink::default());
    let config_store = Arc::new(MockConfigStore::new(config));

    let device = DeviceConfig {
        device_id: 0,
        channels: 1,
        sample_rate: 16_000,
    };

    let service = DictationService::new(
        audio,
        Arc::clone(&transcriber),
        Arc::clone(&injector),
        Arc::clone(&sink),
        Arc::clone(&config_store),
        device,
        TranscribeRequest::default(),
        None,
    );

    Harness {
        service,
        transcriber,
        injector,
        sink,
        config_store,
    }
}

#[tokio::test]
async fn toggle_records_transcribes_and_types() {
    let h = harness(MockAudio::new(4), AppConfig::defaults());

    let response = h.service.handle(Command::Toggle).await;
    assert_eq!(response, "RECORDING_STARTED");
    assert_eq!(h.service.state(), SessionState::Recording);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = h.service.handle(Command::Toggle).await;
    assert_eq!(response, "PROCESSED: \"hello world\"");
    assert_eq!(h.service.state(), SessionState::Idle);

    // Trailing space separates consecutive dictations
    assert_eq!(*h.injector.typed.lock().unwrap(), vec!["hello world "]);

    let frames = h.sink.frames.lock().unwrap().clone();
    assert_eq!(
        frames,
        vec![
            "RECORDING_STARTED",
            "RECORDING_STOPPED",
            "PROCESSED: \"hello world\"",
        ]
    );
}

#[tokio::test]
async fn discard_when_idle_reports_not_recording() {
    let h = harness(MockAudio::new(4), AppConfig::defaults());

    let response = h.service.handle(Command::Discard).await;
    assert_eq!(response, "NOT_RECORDING");
    assert!(h.sink.frames.lock().unwrap().is_empty());
}

#[tokio::test]
async fn discard_during_recording_skips_transcription() {
    let h = harness(MockAudio::new(4), AppConfig::defaults());

    h.service.handle(Command::Toggle).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    let response = h.service.handle(Command::Discard).await;
    assert_eq!(response, "RECORDING_DISCARDED");
    assert_eq!(h.service.state(), SessionState::Idle);

    assert!(h.transcriber.requests.lock().unwrap().is_empty());
    assert!(h.injector.typed.lock().unwrap().is_empty());

    // The indicator gets the neutral processed frame so it returns to idle
    let frames = h.sink.frames.lock().unwrap().clone();
    assert_eq!(frames, vec!["RECORDING_STARTED", "PROCESSED"]);
}

#[tokio::test]
async fn stop_with_no_audio_yields_empty_transcript() {
    let h = harness(MockAudio::new(0), AppConfig::defaults());

    h.service.handle(Command::Toggle).await;
    let response = h.service.handle(Command::Toggle).await;

    assert_eq!(response, "PROCESSED: \"\"");
    assert!(h.transcriber.requests.lock().unwrap().is_empty());
    // Nothing to type for an empty transcript
    assert!(h.injector.typed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn repeated_cycles_keep_the_state_machine_consistent() {
    let h = harness(MockAudio::new(2), AppConfig::defaults());

    // Repeated full cycles must keep the state machine consistent
    for _ in 0..3 {
        assert_eq!(h.service.handle(Command::Toggle).await, "RECORDING_STARTED");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let response = h.service.handle(Command::Toggle).await;
        assert!(response.starts_with("PROCESSED:"));
        assert_eq!(h.service.state(), SessionState::Idle);
    }
}

#[tokio::test]
async fn commands_during_transcription_are_rejected_busy() {
    let (transcriber, release) = GatedTranscriber::new();
    let transcriber = Arc::new(transcriber);
    let injector = Arc::new(MockInjector::default());
    let sink = Arc::new(MockSink::default());
    let config_store = Arc::new(MockConfigStore::new(AppConfig::defaults()));

    let service = Arc::new(DictationService::new(
        MockAudio::new(4),
        Arc::clone(&transcriber),
        Arc::clone(&injector),
        Arc::clone(&sink),
        config_store,
        DeviceConfig {
            device_id: 0,
            channels: 1,
            sample_rate: 16_000,
        },
        TranscribeRequest::default(),
        None,
    ));

    service.handle(Command::Toggle).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Stop toggle runs on its own task and parks inside the transcriber
    let stopping = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.handle(Command::Toggle).await })
    };

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while service.state() != SessionState::Processing {
        assert!(
            tokio::time::Instant::now() < deadline,
            "never entered processing"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let toggle = service.handle(Command::Toggle).await;
    assert!(toggle.starts_with("BUSY"), "got: {toggle}");
    let discard = service.handle(Command::Discard).await;
    assert!(discard.starts_with("BUSY"), "got: {discard}");

    // The colliding commands did not disturb the in-flight result
    release.send(()).unwrap();
    let response = stopping.await.unwrap();
    assert_eq!(response, "PROCESSED: \"hello world\"");
    assert_eq!(service.state(), SessionState::Idle);
    assert_eq!(*transcriber.calls.lock().unwrap(), 1);
    assert_eq!(*injector.typed.lock().unwrap(), vec!["hello world "]);
}

#[tokio::test]
async fn dead_stream_mid_recording_recovers_to_idle() {
    let h = harness(MockAudio::new(2).dying_mid_stream(), AppConfig::defaults());

    let response = h.service.handle(Command::Toggle).await;
    assert_eq!(response, "RECORDING_STARTED");

    // The monitor notices the dead worker, returns the session to idle, and
    // tells the indicator in order
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let frames = h.sink.frames.lock().unwrap().clone();
        if frames.len() >= 3 {
            assert_eq!(
                frames,
                vec!["RECORDING_STARTED", "RECORDING_STOPPED", "PROCESSED"]
            );
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "monitor never recovered, frames: {frames:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(h.service.state(), SessionState::Idle);
    assert!(h.transcriber.requests.lock().unwrap().is_empty());
    assert!(h.injector.typed.lock().unwrap().is_empty());

    // A new recording can start on the recovered session
    let response = h.service.handle(Command::Toggle).await;
    assert_eq!(response, "RECORDING_STARTED");
}

#[tokio::test]
async fn reload_while_recording_is_rejected_busy() {
    let h = harness(MockAudio::new(4), AppConfig::defaults());

    h.service.handle(Command::Toggle).await;
    let response = h.service.handle(Command::ReloadConfig).await;
    assert!(response.starts_with("BUSY"), "got: {response}");

    // The recording is untouched
    assert_eq!(h.service.state(), SessionState::Recording);
    let _ = h.service.handle(Command::Discard).await;
}

#[tokio::test]
async fn reload_applies_new_model_and_persists_device() {
    let mut config = AppConfig::defaults();
    config.model = Some("small".to_string());
    config.audio_device = None;
    let h = harness(MockAudio::new(2), config);

    let response = h.service.handle(Command::ReloadConfig).await;
    assert_eq!(response, "Configuration reloaded successfully");
    assert_eq!(h.service.state(), SessionState::Idle);

    // The discovered device id was written back
    let saved = h.config_store.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].audio_device, Some(0));

    // The next transcription uses the reloaded model
    h.service.handle(Command::Toggle).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    h.service.handle(Command::Toggle).await;

    let requests = h.transcriber.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, ModelSize::Small);

    let frames = h.sink.frames.lock().unwrap().clone();
    assert_eq!(frames[0], "CONFIG_CHANGED");
}

#[tokio::test]
async fn failed_injection_hands_text_to_the_indicator() {
    let h = harness_with_injector(
        MockAudio::new(4),
        AppConfig::defaults(),
        MockInjector::failing(),
    );

    h.service.handle(Command::Toggle).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    let response = h.service.handle(Command::Toggle).await;
    assert_eq!(response, "PROCESSED: \"hello world\"");

    let frames = h.sink.frames.lock().unwrap().clone();
    assert_eq!(
        frames,
        vec![
            "RECORDING_STARTED",
            "RECORDING_STOPPED",
            "PROCESSED: \"hello world\"",
            "TYPE:hello world ",
        ]
    );
}

#[tokio::test]
async fn list_devices_marks_the_active_one() {
    let h = harness(MockAudio::new(0), AppConfig::defaults());

    let response = h.service.handle(Command::ListDevices).await;
    let lines: Vec<&str> = response.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("USB Mic"));
    assert!(lines[0].ends_with("[ACTIVE]"));
    assert!(lines[1].contains("HDA Intel"));
    assert!(!lines[1].contains("[ACTIVE]"));
}

#[tokio::test]
async fn list_devices_with_none_found() {
    let h = harness(MockAudio::new(0).without_devices(), AppConfig::defaults());

    let response = h.service.handle(Command::ListDevices).await;
    assert_eq!(response, "No input devices found");
}
