//! Simulated capture device.
//!
//! Each period a tone is synthesised in the hardware layout, converted to the
//! layout the pipeline asked for, and enqueued. Whatever does not fit is an
//! overrun and is counted, never blocked on.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use audio_passthrough_core::{
    convert_frames, AllocError, FrameLayout, MonoSource, PassthroughError, SoundDriver, StreamDirection, StreamQueue,
};

use crate::config::SimulationConfig;
use crate::interrupt::PeriodicWorker;
use crate::tone::ToneGenerator;

/// Counters kept by the capture interrupt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureStats {
    pub periods: u64,
    pub bytes_enqueued: u64,
    /// Bytes the queue had no room for.
    pub overrun_bytes: u64,
}

pub struct SimulatedCapture {
    name: String,
    sample_rate: u32,
    sim: SimulationConfig,
    layout: Option<FrameLayout>,
    stats: Arc<Mutex<CaptureStats>>,
    worker: Option<PeriodicWorker>,
}

impl SimulatedCapture {
    pub fn new(sim: SimulationConfig, sample_rate: u32) -> Self {
        Self {
            name: "sim-capture".into(),
            sample_rate,
            sim,
            layout: None,
            stats: Arc::new(Mutex::new(CaptureStats::default())),
            worker: None,
        }
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats.lock().clone()
    }

    pub fn stats_handle(&self) -> Arc<Mutex<CaptureStats>> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(PeriodicWorker::is_running)
    }
}

/// One simulated interrupt: produce a hardware period and hand it to the queue.
struct CaptureIrq {
    tone: ToneGenerator,
    hardware: FrameLayout,
    client: FrameLayout,
    hw_buf: Vec<u8>,
    client_buf: Vec<u8>,
    queue: Arc<StreamQueue>,
    stats: Arc<Mutex<CaptureStats>>,
}

impl CaptureIrq {
    fn service(&mut self) {
        let frames = self.tone.fill(&mut self.hw_buf, self.hardware);
        let frames = convert_frames(
            &self.hw_buf[..frames * self.hardware.frame_size()],
            self.hardware,
            &mut self.client_buf,
            self.client,
            MonoSource::Left,
        );
        let produced = frames * self.client.frame_size();
        let enqueued = self.queue.write(&self.client_buf[..produced]);

        let mut stats = self.stats.lock();
        stats.periods += 1;
        stats.bytes_enqueued += enqueued as u64;
        stats.overrun_bytes += (produced - enqueued) as u64;
    }
}

impl SoundDriver for SimulatedCapture {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> StreamDirection {
        StreamDirection::Capture
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

        let mut irq = CaptureIrq {
            tone: ToneGenerator::new(self.sim.tone_hz, self.sim.tone_amplitude, self.sample_rate),
            hardware,
            client,
            hw_buf: vec![0u8; period * hardware.frame_size()],
            client_buf: vec![0u8; period * client.frame_size()],
            queue,
            stats: Arc::clone(&self.stats),
        };

        let worker = PeriodicWorker::spawn(&self.name, self.sim.period(self.sample_rate), move || irq.service())
            .map_err(|e| PassthroughError::StartFailed {
                device: self.name.clone(),
                reason: e.to_string(),
            })?;
        self.worker = Some(worker);
        log::info!(
            "{}: {} frame periods, {:?} x{} hardware",
            self.name,
            period,
            hardware.format,
            hardware.channels
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PassthroughError> {
        match self.worker.take() {
            Some(mut worker) => {
                worker.stop()?;
                let stats = self.stats();
                log::info!(
                    "{}: stopped after {} periods, {} overrun bytes",
                    self.name,
                    stats.periods,
                    stats.overrun_bytes
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for SimulatedCapture {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{}: {}", self.name, e);
        }
    }
}
