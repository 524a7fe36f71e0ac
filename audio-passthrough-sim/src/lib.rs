//! # audio-passthrough-sim
//!
//! Simulated sound drivers for audio-passthrough.
//!
//! Provides:
//! - `SimulatedCapture`: tone source producing one hardware period per interrupt
//! - `SimulatedPlayback`: silence-padded sink consuming one period per interrupt
//! - `SimulationConfig` / `SimulationPlan`: JSON-loadable device and run settings
//!
//! Each device runs its own interrupt thread, paced at
//! `period_frames / sample_rate`, and converts between the hardware layout
//! (24-bit padded stereo by default) and the pipeline's queue layout.
//!
//! ## Usage
//! ```no_run
//! use audio_passthrough_core::{PassthroughConfiguration, PassthroughSession};
//! use audio_passthrough_sim::{SimulatedCapture, SimulatedPlayback, SimulationConfig};
//!
//! let config = PassthroughConfiguration::default();
//! let sim = SimulationConfig::default();
//! let mut session = PassthroughSession::new(config.clone());
//! session
//!     .start(
//!         SimulatedCapture::new(sim.clone(), config.sample_rate),
//!         SimulatedPlayback::new(sim, config.sample_rate),
//!     )
//!     .unwrap();
//! let summary = session.stop().unwrap();
//! ```

pub mod config;
pub mod interrupt;
pub mod simulated_capture;
pub mod simulated_playback;
pub mod tone;

pub use config::{SimulationConfig, SimulationPlan, HARDWARE_PERIOD_FRAMES};
pub use interrupt::PeriodicWorker;
pub use simulated_capture::{CaptureStats, SimulatedCapture};
pub use simulated_playback::{OutputTap, PlaybackStats, SimulatedPlayback};
pub use tone::ToneGenerator;
