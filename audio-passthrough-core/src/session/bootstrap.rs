use std::sync::Arc;

use crate::models::config::PassthroughConfiguration;
use crate::models::error::PassthroughError;
use crate::session::copy_loop::{CopyLoop, LOG_TAG};
use crate::session::endpoint::{CaptureEndpoint, PlaybackEndpoint};
use crate::traits::diagnostic_sink::{DiagnosticSink, LogSink, Severity};
use crate::traits::sound_driver::SoundDriver;

/// One-shot, strictly ordered pipeline setup.
///
/// ```text
/// validate → check rates → allocate capture → format capture → allocate playback
///          → format playback → start capture → start playback → CopyLoop
/// ```
///
/// Each step runs only if the previous one succeeded. A failing step is
/// reported through the sink at `Panic` severity and returned as an error, so
/// a partially configured pipeline is never handed out.
pub struct PipelineBootstrap {
    config: PassthroughConfiguration,
    sink: Arc<dyn DiagnosticSink>,
}

impl PipelineBootstrap {
    pub fn new(config: PassthroughConfiguration, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { config, sink }
    }

    /// Bootstrap that reports through the `log` facade.
    pub fn with_log_sink(config: PassthroughConfiguration) -> Self {
        Self::new(config, Arc::new(LogSink))
    }

    pub fn config(&self) -> &PassthroughConfiguration {
        &self.config
    }

    pub fn run<C: SoundDriver, P: SoundDriver>(
        &self,
        capture_driver: C,
        playback_driver: P,
    ) -> Result<CopyLoop<C, P>, PassthroughError> {
        let config = &self.config;
        config
            .validate()
            .map_err(PassthroughError::Configuration)
            .map_err(|e| self.fatal("invalid passthrough configuration", e))?;
        let layout = config.layout();

        self.check_rate("input", &capture_driver)?;
        self.check_rate("output", &playback_driver)?;

        let mut capture = CaptureEndpoint::new(capture_driver).map_err(|e| self.fatal("unusable input sound device", e))?;
        let mut playback =
            PlaybackEndpoint::new(playback_driver).map_err(|e| self.fatal("unusable output sound device", e))?;

        capture
            .allocate_queue(config.queue_duration_ms, layout)
            .map_err(|e| self.fatal("cannot allocate input sound queue", e))?;
        self.notice(&format!("input sound queue allocated on {}", capture.name()));

        capture
            .set_format(config.format, config.channels)
            .map_err(|e| self.fatal("cannot set input sound format", e))?;
        self.notice(&format!("input sound format set to {:?} x{}", config.format, config.channels));

        playback
            .allocate_queue(config.queue_duration_ms, layout)
            .map_err(|e| self.fatal("cannot allocate output sound queue", e))?;
        self.notice(&format!("output sound queue allocated on {}", playback.name()));

        playback
            .set_format(config.format, config.channels)
            .map_err(|e| self.fatal("cannot set output sound format", e))?;
        self.notice(&format!("output sound format set to {:?} x{}", config.format, config.channels));

        capture
            .start()
            .map_err(|e| self.fatal("cannot start input sound device", e))?;
        self.notice("input sound device started");

        if let Err(e) = playback.start() {
            if let Err(stop_err) = capture.stop() {
                self.sink.write(LOG_TAG, Severity::Error, &format!("cannot stop input sound device: {}", stop_err));
            }
            return Err(self.fatal("cannot start output sound device", e));
        }
        self.notice("output sound device started");

        CopyLoop::new(capture, playback, config, Arc::clone(&self.sink))
            .map_err(|e| self.fatal("cannot hand sound devices to copy loop", e))
    }

    /// Queues are sized at the driver's rate, so it must be the configured one.
    fn check_rate<D: SoundDriver>(&self, role: &str, driver: &D) -> Result<(), PassthroughError> {
        let rate = driver.sample_rate();
        if rate == self.config.sample_rate {
            return Ok(());
        }
        let error = PassthroughError::Configuration(format!(
            "{} runs at {} Hz, configured rate is {} Hz",
            driver.name(),
            rate,
            self.config.sample_rate
        ));
        Err(self.fatal(&format!("{} sound device rate mismatch", role), error))
    }

    fn notice(&self, message: &str) {
        self.sink.write(LOG_TAG, Severity::Notice, message);
    }

    fn fatal(&self, step: &str, error: PassthroughError) -> PassthroughError {
        self.sink.write(LOG_TAG, Severity::Panic, &format!("{}: {}", step, error));
        error
    }
}
