use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::config::PassthroughConfiguration;
use crate::models::diagnostics::{PipelineDiagnostics, PipelineSummary};
use crate::models::error::PassthroughError;
use crate::session::bootstrap::PipelineBootstrap;
use crate::session::copy_loop::{CopyLoop, ShutdownSignal};
use crate::traits::activity::ActivityIndicator;
use crate::traits::diagnostic_sink::{DiagnosticSink, LogSink};
use crate::traits::sound_driver::SoundDriver;

const THREAD_NAME: &str = "audio-passthrough";

/// Copy loop running on its own thread.
struct RunningLoop<C: SoundDriver, P: SoundDriver> {
    shutdown: ShutdownSignal,
    handle: thread::JoinHandle<CopyLoop<C, P>>,
    diagnostics: Arc<Mutex<PipelineDiagnostics>>,
    started_at: DateTime<Utc>,
}

/// Runs a bootstrapped pipeline on a dedicated thread.
///
/// `start` bootstraps and spawns the loop; `stop` raises shutdown, joins the
/// thread, stops both endpoints and returns a [`PipelineSummary`].
pub struct PassthroughSession<C: SoundDriver + 'static, P: SoundDriver + 'static> {
    config: PassthroughConfiguration,
    sink: Arc<dyn DiagnosticSink>,
    activity: Option<Box<dyn ActivityIndicator>>,
    running: Option<RunningLoop<C, P>>,
    last_diagnostics: PipelineDiagnostics,
}

impl<C: SoundDriver + 'static, P: SoundDriver + 'static> PassthroughSession<C, P> {
    pub fn new(config: PassthroughConfiguration) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
            activity: None,
            running: None,
            last_diagnostics: PipelineDiagnostics::default(),
        }
    }

    pub fn set_sink(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// Indicator handed to the next copy loop started.
    pub fn set_activity(&mut self, activity: Box<dyn ActivityIndicator>) {
        self.activity = Some(activity);
    }

    pub fn config(&self) -> &PassthroughConfiguration {
        &self.config
    }

    /// True while the copy loop thread has not finished.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Live counters while running, final counters after `stop`.
    pub fn diagnostics(&self) -> PipelineDiagnostics {
        match &self.running {
            Some(running) => running.diagnostics.lock().clone(),
            None => self.last_diagnostics.clone(),
        }
    }

    pub fn start(&mut self, capture: C, playback: P) -> Result<(), PassthroughError> {
        if self.running.is_some() {
            return Err(PassthroughError::SessionAlreadyRunning);
        }

        let bootstrap = PipelineBootstrap::new(self.config.clone(), Arc::clone(&self.sink));
        let mut copy_loop = bootstrap.run(capture, playback)?;
        if let Some(activity) = self.activity.take() {
            copy_loop.set_activity(activity);
        }

        let shutdown = ShutdownSignal::new();
        let diagnostics = copy_loop.diagnostics_handle();
        let signal = shutdown.clone();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                copy_loop.run(&signal);
                copy_loop
            })
            .map_err(|e| PassthroughError::Thread(format!("failed to spawn copy loop: {}", e)))?;

        log::info!("passthrough session started");
        self.running = Some(RunningLoop {
            shutdown,
            handle,
            diagnostics,
            started_at: Utc::now(),
        });
        Ok(())
    }

    pub fn stop(&mut self) -> Result<PipelineSummary, PassthroughError> {
        let running = self.running.take().ok_or(PassthroughError::SessionNotRunning)?;

        running.shutdown.request();
        let mut copy_loop = running
            .handle
            .join()
            .map_err(|_| PassthroughError::Thread("copy loop thread panicked".into()))?;
        let stopped = copy_loop.shutdown();

        self.last_diagnostics = copy_loop.diagnostics();
        stopped?;

        let summary = PipelineSummary::new(self.config.clone(), running.started_at, self.last_diagnostics.clone());
        log::info!(
            "passthrough session {} stopped after {:.2}s",
            summary.id,
            summary.duration_secs
        );
        Ok(summary)
    }
}

impl<C: SoundDriver + 'static, P: SoundDriver + 'static> Drop for PassthroughSession<C, P> {
    fn drop(&mut self) {
        if self.running.is_some() {
            if let Err(e) = self.stop() {
                log::error!("passthrough session did not stop cleanly: {}", e);
            }
        }
    }
}
