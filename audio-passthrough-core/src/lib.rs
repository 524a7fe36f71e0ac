//! # audio-passthrough-core
//!
//! Platform-agnostic core of a full-duplex PCM passthrough.
//!
//! Frames captured by one sound driver are copied, chunk by chunk, into the
//! queue of another driver for playback. Drivers implement the `SoundDriver`
//! trait and are handed to `PipelineBootstrap` (or `PassthroughSession`, which
//! also owns the copy-loop thread).
//!
//! ## Architecture
//!
//! ```text
//! audio-passthrough-core (this crate)
//! ├── traits/       ← SoundDriver, DiagnosticSink, ActivityIndicator
//! ├── models/       ← PassthroughError, SampleFormat, EndpointState, PassthroughConfiguration
//! ├── processing/   ← ByteRing, StreamQueue, format conversion
//! └── session/      ← Endpoint, CopyLoop, PipelineBootstrap, PassthroughSession
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

pub use models::config::{PassthroughConfiguration, PollMode};
pub use models::diagnostics::{PipelineDiagnostics, PipelineSummary};
pub use models::error::{AllocError, PassthroughError};
pub use models::sample_format::{FormatInfo, FrameLayout, SampleFormat, MAX_FRAME_SIZE};
pub use models::state::{EndpointState, StreamDirection};
pub use processing::convert::{convert_frames, peak_level, MonoSource};
pub use processing::ring_buffer::ByteRing;
pub use processing::stream_queue::StreamQueue;
pub use session::bootstrap::PipelineBootstrap;
pub use session::copy_loop::{CopyLoop, IterationOutcome, ShutdownSignal};
pub use session::endpoint::{CaptureEndpoint, Endpoint, PlaybackEndpoint};
pub use session::passthrough::PassthroughSession;
pub use traits::activity::{ActivityIndicator, LogActivity, NoActivity};
pub use traits::diagnostic_sink::{DiagnosticSink, LogSink, Severity};
pub use traits::sound_driver::SoundDriver;
