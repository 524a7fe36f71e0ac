use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{PassthroughConfiguration, PollMode};
use crate::models::diagnostics::PipelineDiagnostics;
use crate::models::error::PassthroughError;
use crate::models::sample_format::{FrameLayout, MAX_FRAME_SIZE};
use crate::processing::convert;
use crate::session::endpoint::{CaptureEndpoint, PlaybackEndpoint};
use crate::traits::activity::{ActivityIndicator, NoActivity};
use crate::traits::diagnostic_sink::{DiagnosticSink, Severity};
use crate::traits::sound_driver::SoundDriver;

pub(crate) const LOG_TAG: &str = "passthrough";

/// Cooperative stop flag, checked once per copy-loop iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a single iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Capture had no whole frame available.
    Idle,
    /// Everything read was accepted by playback.
    Copied { bytes: usize },
    /// Playback accepted only `written` of `read` bytes; the rest is lost.
    Dropped { read: usize, written: usize },
}

/// Steady-state mover of frames from capture to playback.
///
/// ```text
/// [capture driver] → [capture queue] → read → scratch → write → [playback queue] → [playback driver]
/// ```
///
/// Owns both endpoints once bootstrap succeeds. The scratch buffer is sized
/// once for the worst-case frame and reused, so iterations never allocate.
pub struct CopyLoop<C: SoundDriver, P: SoundDriver> {
    capture: CaptureEndpoint<C>,
    playback: PlaybackEndpoint<P>,
    sink: Arc<dyn DiagnosticSink>,
    activity: Box<dyn ActivityIndicator>,
    poll_mode: PollMode,
    layout: FrameLayout,
    chunk_bytes: usize,
    buffer: Vec<u8>,
    iteration: u64,
    diagnostics: Arc<Mutex<PipelineDiagnostics>>,
}

impl<C: SoundDriver, P: SoundDriver> CopyLoop<C, P> {
    /// Take ownership of two started endpoints and mark them running.
    ///
    /// If either is not started, both are stopped and the error returned.
    pub fn new(
        mut capture: CaptureEndpoint<C>,
        mut playback: PlaybackEndpoint<P>,
        config: &PassthroughConfiguration,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, PassthroughError> {
        if let Err(e) = capture.mark_running().and_then(|()| playback.mark_running()) {
            if capture.state().is_streaming() {
                if let Err(stop_err) = capture.stop() {
                    log::warn!("{}: {}", capture.name(), stop_err);
                }
            }
            if playback.state().is_streaming() {
                if let Err(stop_err) = playback.stop() {
                    log::warn!("{}: {}", playback.name(), stop_err);
                }
            }
            return Err(e);
        }

        let layout = config.layout();
        Ok(Self {
            capture,
            playback,
            sink,
            activity: Box::new(NoActivity),
            poll_mode: config.poll_mode,
            layout,
            chunk_bytes: config.chunk_bytes(),
            buffer: vec![0u8; config.chunk_frames * MAX_FRAME_SIZE],
            iteration: 0,
            diagnostics: Arc::new(Mutex::new(PipelineDiagnostics::default())),
        })
    }

    pub fn set_activity(&mut self, activity: Box<dyn ActivityIndicator>) {
        self.activity = activity;
    }

    /// Shared handle for reading counters from another thread.
    pub fn diagnostics_handle(&self) -> Arc<Mutex<PipelineDiagnostics>> {
        Arc::clone(&self.diagnostics)
    }

    pub fn diagnostics(&self) -> PipelineDiagnostics {
        self.diagnostics.lock().clone()
    }

    pub fn capture(&self) -> &CaptureEndpoint<C> {
        &self.capture
    }

    pub fn playback(&self) -> &PlaybackEndpoint<P> {
        &self.playback
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Move at most one chunk from capture to playback.
    pub fn run_iteration(&mut self) -> IterationOutcome {
        self.iteration += 1;

        let chunk = &mut self.buffer[..self.chunk_bytes];
        let read = match self.poll_mode.timeout() {
            Some(timeout) => self.capture.read_timeout(chunk, timeout),
            None => self.capture.read(chunk),
        };

        let outcome = if read == 0 {
            IterationOutcome::Idle
        } else {
            let written = self.playback.write(&self.buffer[..read]);
            if written < read {
                self.sink.write(
                    LOG_TAG,
                    Severity::Warning,
                    &format!("sound data dropped ({} of {} bytes)", read - written, read),
                );
                IterationOutcome::Dropped { read, written }
            } else {
                IterationOutcome::Copied { bytes: read }
            }
        };

        self.activity.tick(self.iteration);
        self.record(outcome, read);
        outcome
    }

    fn record(&self, outcome: IterationOutcome, read: usize) {
        let peak = (read > 0).then(|| convert::peak_level(&self.buffer[..read], self.layout));

        let mut d = self.diagnostics.lock();
        d.iterations += 1;
        match outcome {
            IterationOutcome::Idle => d.idle_polls += 1,
            IterationOutcome::Copied { bytes } => {
                d.bytes_read += bytes as u64;
                d.bytes_written += bytes as u64;
            }
            IterationOutcome::Dropped { read, written } => {
                d.bytes_read += read as u64;
                d.bytes_written += written as u64;
                d.bytes_dropped += (read - written) as u64;
                d.short_writes += 1;
            }
        }
        if let Some(peak) = peak {
            d.peak_level = peak;
        }
    }

    /// Iterate until `shutdown` is raised. Returns the final counters.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> PipelineDiagnostics {
        log::info!(
            "copy loop running: {} byte chunks, {:?}",
            self.chunk_bytes,
            self.poll_mode
        );
        while !shutdown.is_requested() {
            if self.run_iteration() == IterationOutcome::Idle && self.poll_mode == PollMode::BusyPoll {
                std::hint::spin_loop();
            }
        }
        let diagnostics = self.diagnostics();
        log::info!(
            "copy loop stopped after {} iterations ({} bytes dropped)",
            diagnostics.iterations,
            diagnostics.bytes_dropped
        );
        diagnostics
    }

    /// Stop both endpoints. Both are attempted; the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), PassthroughError> {
        let capture = if self.capture.state().is_stopped() { Ok(()) } else { self.capture.stop() };
        let playback = if self.playback.state().is_stopped() { Ok(()) } else { self.playback.stop() };

        for e in [&capture, &playback].into_iter().filter_map(|r| r.as_ref().err()) {
            self.sink.write(LOG_TAG, Severity::Error, &format!("stop failed: {}", e));
        }
        capture.and(playback)
    }
}
