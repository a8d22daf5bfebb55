//! The capture worker: a dedicated thread that drains the bounded chunk
//! queue fed by the audio backend while recording is active.
//!
//! The worker polls with a short timeout so a stop signal (or a discard) is
//! observed within ~100 ms, without an unbounded blocking read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::application::ports::{AudioInput, CaptureStreamError, StreamGuard};
use crate::domain::audio::AudioChunk;

/// Depth of the chunk queue between the stream callback and the worker.
const QUEUE_DEPTH: usize = 64;

/// How long the worker blocks on the queue before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a stopped worker hands back.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    pub chunks: Vec<AudioChunk>,
    /// The stream died before a stop was requested (device error).
    pub stream_failed: bool,
}

/// Owns the open input stream (via its guard) and the buffer-filling thread
/// for one recording.
pub struct CaptureWorker {
    stop: Arc<AtomicBool>,
    stream_failed: Arc<AtomicBool>,
    guard: Option<Box<dyn StreamGuard>>,
    thread: Option<JoinHandle<Vec<AudioChunk>>>,
}

impl CaptureWorker {
    /// Open the stream and start accumulating chunks.
    pub fn spawn<A: AudioInput + ?Sized>(
        audio: &A,
        config: &crate::domain::device::DeviceConfig,
    ) -> Result<Self, CaptureStreamError> {
        let (tx, rx) = mpsc::sync_channel::<AudioChunk>(QUEUE_DEPTH);
        let guard = audio.open_stream(config, tx)?;

        let stop = Arc::new(AtomicBool::new(false));
        let stream_failed = Arc::new(AtomicBool::new(false));

        let stop_flag = Arc::clone(&stop);
        let failed_flag = Arc::clone(&stream_failed);
        let thread = std::thread::Builder::new()
            .name("capture-worker".into())
            .spawn(move || {
                let mut chunks = Vec::new();
                loop {
                    if stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    match rx.recv_timeout(POLL_INTERVAL) {
                        Ok(chunk) => chunks.push(chunk),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => {
                            // The backend dropped the sender. Only a failure
                            // if nobody asked us to stop.
                            if !stop_flag.load(Ordering::SeqCst) {
                                failed_flag.store(true, Ordering::SeqCst);
                            }
                            break;
                        }
                    }
                }
                // Drain anything still queued after the stop signal
                while let Ok(chunk) = rx.try_recv() {
                    chunks.push(chunk);
                }
                chunks
            })
            .map_err(|e| CaptureStreamError(format!("failed to spawn capture worker: {e}")))?;

        Ok(Self {
            stop,
            stream_failed,
            guard: Some(guard),
            thread: Some(thread),
        })
    }

    /// Whether the worker thread has exited. True before a stop request
    /// means the stream died mid-recording.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| t.is_finished())
            .unwrap_or(true)
    }

    /// Signal stop, close the stream, and join. The join is bounded by the
    /// poll interval since the thread re-checks the flag on every timeout.
    pub fn stop(mut self) -> CaptureOutcome {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(guard) = self.guard.take() {
            guard.close();
        }
        let chunks = self
            .thread
            .take()
            .and_then(|t| t.join().ok())
            .unwrap_or_default();
        CaptureOutcome {
            chunks,
            stream_failed: self.stream_failed.load(Ordering::SeqCst),
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(guard) = self.guard.take() {
            guard.close();
        }
    }
}
