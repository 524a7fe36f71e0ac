use std::sync::Arc;

use crate::models::error::{AllocError, PassthroughError};
use crate::models::sample_format::FrameLayout;
use crate::models::state::StreamDirection;
use crate::processing::stream_queue::StreamQueue;

/// Interface for hardware (or simulated) capture and playback devices.
///
/// Implemented by:
/// - `SimulatedCapture` / `SimulatedPlayback` (audio-passthrough-sim)
/// - test doubles with scripted fill/drain behavior
///
/// Once `start` succeeds the driver is the queue's producer (capture) or
/// consumer (playback), running concurrently with the copy loop.
pub trait SoundDriver: Send {
    /// Human-readable device name used in diagnostics.
    fn name(&self) -> &str;

    fn direction(&self) -> StreamDirection;

    /// Sample rate the device runs at, in Hz.
    fn sample_rate(&self) -> u32;

    /// Reserve the stream queue for this device.
    ///
    /// The default sizes it from `duration_ms` at the device's sample rate.
    /// Drivers with a memory budget override this to refuse oversized queues.
    fn allocate_queue(&mut self, duration_ms: u32, layout: FrameLayout) -> Result<Arc<StreamQueue>, AllocError> {
        StreamQueue::allocate(duration_ms, self.sample_rate(), layout).map(Arc::new)
    }

    /// Tell the device which layout the application side of the queue uses.
    fn set_format(&mut self, layout: FrameLayout) -> Result<(), PassthroughError>;

    /// Hand the queue to the device and begin streaming.
    fn start(&mut self, queue: Arc<StreamQueue>) -> Result<(), PassthroughError>;

    /// Stop streaming and release the queue.
    fn stop(&mut self) -> Result<(), PassthroughError>;
}
