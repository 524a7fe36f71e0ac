use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use audio_passthrough_core::{AllocError, FrameLayout, PassthroughConfiguration, PassthroughError, SampleFormat, StreamQueue};

/// Frames per hardware period: a 384-word DMA block, ten blocks, two channels.
pub const HARDWARE_PERIOD_FRAMES: usize = 384 * 10 / 2;

/// How the simulated devices behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Layout the simulated hardware transfers (default: 24-bit in 32, stereo).
    pub hardware_format: SampleFormat,
    pub hardware_channels: u16,

    /// Frames moved per simulated interrupt.
    pub period_frames: usize,

    /// Test tone produced by the capture device.
    pub tone_hz: f64,
    pub tone_amplitude: f64,

    /// Largest queue either device will allocate, if any.
    pub memory_limit_bytes: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hardware_format: SampleFormat::Signed24Padded,
            hardware_channels: 2,
            period_frames: HARDWARE_PERIOD_FRAMES,
            tone_hz: 440.0,
            tone_amplitude: 0.5,
            memory_limit_bytes: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.hardware_layout().validate()?;
        if self.period_frames == 0 {
            return Err("period_frames must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.tone_amplitude) {
            return Err(format!("tone amplitude {} is outside 0.0..=1.0", self.tone_amplitude));
        }
        if self.tone_hz < 0.0 {
            return Err(format!("negative tone frequency: {}", self.tone_hz));
        }
        Ok(())
    }

    pub fn hardware_layout(&self) -> FrameLayout {
        FrameLayout::new(self.hardware_format, self.hardware_channels)
    }

    /// Wall-clock length of one hardware period at `sample_rate`.
    pub fn period(&self, sample_rate: u32) -> Duration {
        Duration::from_secs_f64(self.period_frames as f64 / sample_rate.max(1) as f64)
    }

    /// Refuse queues larger than `memory_limit_bytes`.
    pub fn check_budget(&self, duration_ms: u32, sample_rate: u32, layout: FrameLayout) -> Result<(), AllocError> {
        let Some(limit) = self.memory_limit_bytes else {
            return Ok(());
        };
        let requested = StreamQueue::capacity_for(duration_ms, sample_rate, layout).unwrap_or(u64::MAX);
        if requested > limit {
            return Err(AllocError::InsufficientMemory { requested });
        }
        Ok(())
    }
}

/// Everything `passthrough-sim` needs for one run, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationPlan {
    pub pipeline: PassthroughConfiguration,
    pub simulation: SimulationConfig,
    /// How long to pass audio through before stopping.
    pub run_secs: f64,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            pipeline: PassthroughConfiguration::default(),
            simulation: SimulationConfig::default(),
            run_secs: 2.0,
        }
    }
}

impl SimulationPlan {
    pub fn validate(&self) -> Result<(), String> {
        self.pipeline.validate()?;
        self.simulation.validate()?;
        if !(self.run_secs.is_finite() && self.run_secs >= 0.0) {
            return Err(format!("invalid run time: {}", self.run_secs));
        }
        Ok(())
    }

    pub fn run_time(&self) -> Duration {
        Duration::from_secs_f64(self.run_secs)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PassthroughError> {
        let plan: Self = serde_json::from_str(json)
            .map_err(|e| PassthroughError::Configuration(format!("failed to parse simulation plan: {}", e)))?;
        plan.validate().map_err(PassthroughError::Configuration)?;
        Ok(plan)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PassthroughError> {
        let json = fs::read_to_string(path)
            .map_err(|e| PassthroughError::Configuration(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
