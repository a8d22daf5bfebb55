//! Daemon app runner

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::ports::ConfigStore;
use crate::application::{resolve, DictationService};
use crate::infrastructure::audio::CpalAudioInput;
use crate::infrastructure::config::XdgConfigStore;
use crate::infrastructure::keystroke::YdotoolInjector;
use crate::infrastructure::status::SocketStatusSink;
use crate::infrastructure::transcription::WhisperTranscriber;

use super::pid_file::{PidFile, PidFileError};
use super::server::{CommandServer, SocketPath};
use super::signals::wait_for_shutdown;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;

/// Where the last processed recording is dumped for diagnostics.
const DEBUG_WAV_PATH: &str = "/tmp/last_recording.wav";

/// Run daemon mode
pub async fn run_daemon() -> ExitCode {
    // Acquire PID file
    let pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        match e {
            PidFileError::AlreadyRunning(pid) => {
                error!(pid, "another daemon is already running");
            }
            _ => error!(error = %e, "failed to acquire PID file"),
        }
        return ExitCode::from(EXIT_ERROR);
    }

    // Load configuration
    let config_store = XdgConfigStore::new();
    let config = match config_store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "config load failed, using defaults");
            crate::domain::config::AppConfig::defaults()
        }
    };

    // Resolve a working audio device before accepting commands; probes
    // open real streams, so keep them off the async runtime threads.
    let preferred = config.audio_device;
    let resolution = match tokio::task::spawn_blocking(move || {
        resolve(&CpalAudioInput::new(), preferred)
    })
    .await
    {
        Ok(Ok(resolution)) => resolution,
        Ok(Err(e)) => {
            error!(error = %e, "no working audio input device");
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            error!(error = %e, "device resolution task failed");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    // Persist a discovered device id so the next start skips discovery
    if resolution.discovered || config.audio_device.is_none() {
        let mut updated = config.clone();
        updated.audio_device = Some(resolution.device.device_id);
        if let Err(e) = config_store.save(&updated).await {
            warn!(error = %e, "failed to persist discovered device id");
        }
    }

    let service = Arc::new(DictationService::new(
        CpalAudioInput::new(),
        WhisperTranscriber::new(WhisperTranscriber::default_models_dir()),
        YdotoolInjector::new(),
        SocketStatusSink::new(),
        config_store,
        resolution.device,
        config.transcribe_request(),
        Some(PathBuf::from(DEBUG_WAV_PATH)),
    ));

    // Bind the control socket
    let socket_path = SocketPath::new();
    let mut server = CommandServer::new(socket_path.clone());
    if let Err(e) = server.bind() {
        error!(error = %e, "failed to bind control socket");
        return ExitCode::from(EXIT_ERROR);
    }

    let server_service = Arc::clone(&service);
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(server_service).await {
            error!(error = %e, "command server exited");
        }
        // The server moves into this task; its Drop removes the socket file.
    });

    info!(
        pid = std::process::id(),
        socket = %socket_path.path().display(),
        device = resolution.device.device_id,
        rate = resolution.device.sample_rate,
        "daemon started, waiting for commands"
    );

    let result = wait_for_shutdown().await;

    server_task.abort();
    service.shutdown().await;
    let _ = pid_file.release();

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            error!(error = %e, "signal handling failed");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
