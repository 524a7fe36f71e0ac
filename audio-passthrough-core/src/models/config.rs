use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::PassthroughError;
use super::sample_format::{FrameLayout, SampleFormat, MAX_CHANNELS};

/// Shortest and longest queue the pipeline will size, in milliseconds.
pub const MIN_QUEUE_MSECS: u32 = 1;
pub const MAX_QUEUE_MSECS: u32 = 1000;

/// How the copy loop waits when the capture queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PollMode {
    /// Re-poll immediately. Lowest latency, one core spinning.
    BusyPoll,
    /// Sleep on the capture queue until a frame arrives or `timeout_ms` passes.
    Suspend { timeout_ms: u64 },
}

impl PollMode {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::BusyPoll => None,
            Self::Suspend { timeout_ms } => Some(Duration::from_millis(*timeout_ms)),
        }
    }
}

impl Default for PollMode {
    fn default() -> Self {
        Self::Suspend { timeout_ms: 5 }
    }
}

/// Configuration for a passthrough pipeline.
///
/// Resolved once before any queue is allocated; nothing in it changes while
/// the copy loop runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassthroughConfiguration {
    /// Sample rate in Hz shared by capture and playback (default: 48000).
    pub sample_rate: u32,

    /// Interleaved channels per frame, 1 or 2 (default: 2).
    pub channels: u16,

    /// PCM encoding of the frames moved by the copy loop (default: signed 16-bit).
    pub format: SampleFormat,

    /// Capacity of each stream queue in milliseconds of audio (default: 100).
    pub queue_duration_ms: u32,

    /// Largest number of frames moved per copy-loop iteration (default: 1000).
    pub chunk_frames: usize,

    /// Idle strategy of the copy loop.
    pub poll_mode: PollMode,
}

impl PassthroughConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if !(MIN_QUEUE_MSECS..=MAX_QUEUE_MSECS).contains(&self.queue_duration_ms) {
            return Err(format!("unsupported queue duration: {} ms", self.queue_duration_ms));
        }
        if self.chunk_frames == 0 || self.chunk_frames > self.sample_rate as usize {
            return Err(format!("unsupported chunk size: {} frames", self.chunk_frames));
        }
        Ok(())
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.format, self.channels)
    }

    /// Bytes moved by one full copy-loop iteration.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_frames * self.layout().frame_size()
    }

    pub fn from_json_str(json: &str) -> Result<Self, PassthroughError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PassthroughError::Configuration(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(PassthroughError::Configuration)?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PassthroughError> {
        let json = fs::read_to_string(path)
            .map_err(|e| PassthroughError::Configuration(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

impl Default for PassthroughConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            format: SampleFormat::Signed16,
            queue_duration_ms: 100,
            chunk_frames: 1000,
            poll_mode: PollMode::default(),
        }
    }
}
