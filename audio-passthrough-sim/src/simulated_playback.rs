//! Simulated playback device.
//!
//! Each period drains one hardware period from the queue, padding with
//! silence when the queue runs short, and converts it to the hardware layout.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use audio_passthrough_core::{
    convert_frames, peak_level, AllocError, FrameLayout, MonoSource, PassthroughError, SoundDriver, StreamDirection,
    StreamQueue,
};

use crate::config::SimulationConfig;
use crate::interrupt::PeriodicWorker;

/// Receives every period exactly as the hardware would emit it.
pub type OutputTap = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Counters kept by the playback interrupt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackStats {
    pub periods: u64,
    pub bytes_played: u64,
    /// Frames filled with silence because the queue ran dry.
    pub underrun_frames: u64,
    /// Peak of the most recent period's queued data, 0.0–1.0.
    pub peak_level: f32,
}

pub struct SimulatedPlayback {
    name: String,
    sample_rate: u32,
    sim: SimulationConfig,
    layout: Option<FrameLayout>,
    tap: Option<OutputTap>,
    stats: Arc<Mutex<PlaybackStats>>,
    worker: Option<PeriodicWorker>,
}

impl SimulatedPlayback {
    pub fn new(sim: SimulationConfig, sample_rate: u32) -> Self {
        Self {
            name: "sim-playback".into(),
            sample_rate,
            sim,
            layout: None,
            tap: None,
            stats: Arc::new(Mutex::new(PlaybackStats::default())),
            worker: None,
        }
    }

    pub fn set_tap(&mut self, tap: OutputTap) {
        self.tap = Some(tap);
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats.lock().clone()
    }

    pub fn stats_handle(&self) -> Arc<Mutex<PlaybackStats>> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(PeriodicWorker::is_running)
    }
}

struct PlaybackIrq {
    hardware: FrameLayout,
    client: FrameLayout,
    silence: Vec<u8>,
    client_buf: Vec<u8>,
    hw_buf: Vec<u8>,
    queue: Arc<StreamQueue>,
    tap: Option<OutputTap>,
    stats: Arc<Mutex<PlaybackStats>>,
}

impl PlaybackIrq {
    fn service(&mut self) {
        let played = self.queue.drain_padded(&mut self.client_buf, &self.silence);
        let peak = peak_level(&self.client_buf[..played], self.client);
        let frames = convert_frames(
            &self.client_buf,
            self.client,
            &mut self.hw_buf,
            self.hardware,
            MonoSource::Left,
        );
        if let Some(tap) = &self.tap {
            tap(&self.hw_buf[..frames * self.hardware.frame_size()]);
        }

        let client_frame = self.client.frame_size().max(1);
        let mut stats = self.stats.lock();
        stats.periods += 1;
        stats.bytes_played += played as u64;
        stats.underrun_frames += ((self.client_buf.len() - played) / client_frame) as u64;
        if played > 0 {
            stats.peak_level = peak;
        }
    }
}

impl SoundDriver for SimulatedPlayback {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> StreamDirection {
        StreamDirection::Playback
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn allocate_queue(&mut self, duration_ms: u32, layout: FrameLayout) -> Result<Arc<StreamQueue>, AllocError> {
        self.sim.check_budget(duration_ms, self.sample_rate, layout)?;
        StreamQueue::allocate(duration_ms, self.sample_rate, layout).map(Arc::new)
    }

    fn set_format(&mut self, layout: FrameLayout) -> Result<(), PassthroughError> {
        layout.validate().map_err(PassthroughError::Configuration)?;
        self.layout = Some(layout);
        Ok(())
    }

    fn start(&mut self, queue: Arc<StreamQueue>) -> Result<(), PassthroughError> {
        if self.worker.is_some() {
            return Err(PassthroughError::Device(format!("{} already running", self.name)));
        }
        let client = self.layout.ok_or_else(|| PassthroughError::StartFailed {
            device: self.name.clone(),
            reason: "format not set".into(),
        })?;
        let hardware = self.sim.hardware_layout();
        let period = self.sim.period_frames;

        let mut irq = PlaybackIrq {
            hardware,
            client,
            silence: client.silence_frame(),
            client_buf: vec![0u8; period * client.frame_size()],
            hw_buf: vec![0u8; period * hardware.frame_size()],
            queue,
            tap: self.tap.clone(),
            stats: Arc::clone(&self.stats),
        };

        let worker = PeriodicWorker::spawn(&self.name, self.sim.period(self.sample_rate), move || irq.service())
            .map_err(|e| PassthroughError::StartFailed {
                device: self.name.clone(),
                reason: e.to_string(),
            })?;
        self.worker = Some(worker);
        log::info!("{}: {} frame periods", self.name, period);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PassthroughError> {
        match self.worker.take() {
            Some(mut worker) => {
                worker.stop()?;
                let stats = self.stats();
                log::info!(
                    "{}: stopped after {} periods, {} underrun frames",
                    self.name,
                    stats.periods,
                    stats.underrun_frames
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for SimulatedPlayback {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{}: {}", self.name, e);
        }
    }
}
