//! Time-sized PCM byte queue shared between a driver and the copy loop.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::ring_buffer::ByteRing;
use crate::models::config::{MAX_QUEUE_MSECS, MIN_QUEUE_MSECS};
use crate::models::error::AllocError;
use crate::models::sample_format::FrameLayout;

struct QueueInner {
    ring: ByteRing,
    layout: FrameLayout,
}

/// Bounded FIFO of raw PCM bytes, sized in milliseconds of audio.
///
/// Exactly one producer and one consumer use a queue for its lifetime. Reads
/// and writes never block (except `read_timeout`) and always move a whole
/// number of frames; a write that does not fit is cut short and the caller
/// decides what to do with the rest.
///
/// Shared as `Arc<StreamQueue>` between the driver thread and the copy loop.
pub struct StreamQueue {
    inner: Mutex<QueueInner>,
    data_ready: Condvar,
}

impl StreamQueue {
    /// Byte capacity for `duration_ms` of audio in `layout`.
    ///
    /// Frames are rounded up (`ceil(sample_rate * duration_ms / 1000)`) so the
    /// queue always holds at least the requested duration, in whole frames.
    /// Returns `None` on arithmetic overflow.
    pub fn capacity_for(duration_ms: u32, sample_rate: u32, layout: FrameLayout) -> Option<u64> {
        let frames = (sample_rate as u64 * duration_ms as u64).div_ceil(1000);
        frames.checked_mul(layout.frame_size() as u64)
    }

    /// Reserve a queue holding `duration_ms` of audio.
    pub fn allocate(duration_ms: u32, sample_rate: u32, layout: FrameLayout) -> Result<Self, AllocError> {
        if !(MIN_QUEUE_MSECS..=MAX_QUEUE_MSECS).contains(&duration_ms) {
            return Err(AllocError::InvalidDuration(duration_ms));
        }
        let requested = Self::capacity_for(duration_ms, sample_rate, layout)
            .ok_or(AllocError::InsufficientMemory { requested: u64::MAX })?;
        Self::with_capacity(requested, layout)
    }

    /// Reserve a queue holding exactly `frames` frames.
    pub fn allocate_frames(frames: usize, sample_rate: u32, layout: FrameLayout) -> Result<Self, AllocError> {
        if frames == 0 || frames > sample_rate as usize {
            return Err(AllocError::InvalidFrameCount(frames));
        }
        let requested = (frames as u64)
            .checked_mul(layout.frame_size() as u64)
            .ok_or(AllocError::InsufficientMemory { requested: u64::MAX })?;
        Self::with_capacity(requested, layout)
    }

    fn with_capacity(requested: u64, layout: FrameLayout) -> Result<Self, AllocError> {
        let capacity = usize::try_from(requested).map_err(|_| AllocError::InsufficientMemory { requested })?;
        let ring = ByteRing::try_new(capacity).map_err(|_| AllocError::InsufficientMemory { requested })?;
        log::debug!("allocated {} byte sound queue ({:?})", capacity, layout);
        Ok(Self {
            inner: Mutex::new(QueueInner { ring, layout }),
            data_ready: Condvar::new(),
        })
    }

    /// Change the frame layout used for rounding. Capacity is unchanged.
    pub fn set_format(&self, layout: FrameLayout) {
        self.inner.lock().layout = layout;
    }

    pub fn layout(&self) -> FrameLayout {
        self.inner.lock().layout
    }

    /// Dequeue up to `out.len()` bytes, rounded down to whole frames.
    ///
    /// Returns 0 when fewer than one frame is queued.
    pub fn read(&self, out: &mut [u8]) -> usize {
        let mut inner = self.inner.lock();
        Self::read_locked(&mut inner, out)
    }

    /// Like `read`, but waits up to `timeout` for a frame to arrive.
    pub fn read_timeout(&self, out: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        let frame_size = inner.layout.frame_size();
        if out.len() < frame_size {
            return 0;
        }
        while inner.ring.count() < inner.layout.frame_size() {
            if self.data_ready.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        Self::read_locked(&mut inner, out)
    }

    /// Enqueue up to `data.len()` bytes, rounded down to whole frames.
    ///
    /// Returns the number of bytes stored; the remainder was not queued.
    pub fn write(&self, data: &[u8]) -> usize {
        let written = {
            let mut inner = self.inner.lock();
            let count = inner.layout.whole_frames(data.len().min(inner.ring.free()));
            if count == 0 {
                return 0;
            }
            inner.ring.write(&data[..count])
        };
        self.data_ready.notify_all();
        written
    }

    /// Fill `out` completely: queued frames first, then `silence` frames.
    ///
    /// This is the playback driver's side of the queue. Returns the number of
    /// bytes that came from the queue.
    pub fn drain_padded(&self, out: &mut [u8], silence: &[u8]) -> usize {
        let real = self.read(out);
        let padding = &mut out[real..];
        if silence.is_empty() {
            padding.fill(0);
        } else {
            for chunk in padding.chunks_mut(silence.len()) {
                chunk.copy_from_slice(&silence[..chunk.len()]);
            }
        }
        real
    }

    fn read_locked(inner: &mut QueueInner, out: &mut [u8]) -> usize {
        let count = inner.layout.whole_frames(out.len().min(inner.ring.count()));
        if count == 0 {
            return 0;
        }
        inner.ring.read(&mut out[..count])
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.lock().ring.capacity()
    }

    /// Bytes queued and not yet read.
    pub fn available(&self) -> usize {
        self.inner.lock().ring.count()
    }

    /// Bytes that can be written before the queue is full.
    pub fn free(&self) -> usize {
        self.inner.lock().ring.free()
    }

    pub fn capacity_frames(&self) -> usize {
        let inner = self.inner.lock();
        inner.ring.capacity() / inner.layout.frame_size().max(1)
    }

    pub fn frames_available(&self) -> usize {
        let inner = self.inner.lock();
        inner.ring.count() / inner.layout.frame_size().max(1)
    }

    /// Fraction of capacity in use, 0.0–1.0.
    pub fn fill_level(&self) -> f32 {
        let inner = self.inner.lock();
        if inner.ring.capacity() == 0 {
            return 0.0;
        }
        inner.ring.count() as f32 / inner.ring.capacity() as f32
    }

    /// Discard all queued data.
    pub fn reset(&self) {
        self.inner.lock().ring.reset();
    }
}

impl std::fmt::Debug for StreamQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StreamQueue")
            .field("layout", &inner.layout)
            .field("capacity", &inner.ring.capacity())
            .field("available", &inner.ring.count())
            .finish()
    }
}
