use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::models::error::PassthroughError;
use crate::models::sample_format::{FrameLayout, SampleFormat};
use crate::models::state::{EndpointState, StreamDirection};
use crate::processing::stream_queue::StreamQueue;
use crate::traits::sound_driver::SoundDriver;

/// Marker selecting which side of the queue an endpoint exposes.
pub trait EndpointKind: Send + 'static {
    const DIRECTION: StreamDirection;
}

#[derive(Debug)]
pub enum Capture {}

#[derive(Debug)]
pub enum Playback {}

impl EndpointKind for Capture {
    const DIRECTION: StreamDirection = StreamDirection::Capture;
}

impl EndpointKind for Playback {
    const DIRECTION: StreamDirection = StreamDirection::Playback;
}

/// A driver, its stream queue, and the lifecycle state machine around them.
///
/// ```text
/// allocate_queue → set_format → start → mark_running → stop
/// ```
///
/// Every step checks the transition first, so calling `start` before
/// `set_format` is an `InvalidTransition` error and the driver is never touched.
pub struct Endpoint<D: SoundDriver, K: EndpointKind> {
    driver: D,
    state: EndpointState,
    queue: Option<Arc<StreamQueue>>,
    layout: Option<FrameLayout>,
    _kind: PhantomData<K>,
}

/// Application side reads what the capture driver produced.
pub type CaptureEndpoint<D> = Endpoint<D, Capture>;

/// Application side writes what the playback driver will consume.
pub type PlaybackEndpoint<D> = Endpoint<D, Playback>;

impl<D: SoundDriver, K: EndpointKind> Endpoint<D, K> {
    pub fn new(driver: D) -> Result<Self, PassthroughError> {
        if driver.direction() != K::DIRECTION {
            return Err(PassthroughError::DirectionMismatch {
                device: driver.name().to_string(),
                expected: K::DIRECTION,
            });
        }
        Ok(Self {
            driver,
            state: EndpointState::Unconfigured,
            queue: None,
            layout: None,
            _kind: PhantomData,
        })
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    pub fn name(&self) -> &str {
        self.driver.name()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn queue(&self) -> Option<&Arc<StreamQueue>> {
        self.queue.as_ref()
    }

    pub fn layout(&self) -> Option<FrameLayout> {
        self.layout
    }

    /// Unconfigured → QueueAllocated.
    pub fn allocate_queue(&mut self, duration_ms: u32, layout: FrameLayout) -> Result<(), PassthroughError> {
        self.check(EndpointState::QueueAllocated)?;
        let queue = self.driver.allocate_queue(duration_ms, layout)?;
        log::debug!("{}: {} byte queue for {} ms", self.name(), queue.capacity(), duration_ms);
        self.queue = Some(queue);
        self.advance(EndpointState::QueueAllocated);
        Ok(())
    }

    /// QueueAllocated → FormatSet.
    pub fn set_format(&mut self, format: SampleFormat, channels: u16) -> Result<(), PassthroughError> {
        self.check(EndpointState::FormatSet)?;
        let layout = FrameLayout::new(format, channels);
        layout.validate().map_err(PassthroughError::Configuration)?;

        self.driver.set_format(layout)?;
        if let Some(queue) = &self.queue {
            queue.set_format(layout);
        }
        self.layout = Some(layout);
        self.advance(EndpointState::FormatSet);
        Ok(())
    }

    /// FormatSet → Started. The driver becomes the queue's producer or consumer.
    pub fn start(&mut self) -> Result<(), PassthroughError> {
        self.check(EndpointState::Started)?;
        let queue = self.queue.clone().ok_or(PassthroughError::InvalidTransition {
            from: self.state,
            to: EndpointState::Started,
        })?;
        self.driver.start(queue)?;
        self.advance(EndpointState::Started);
        Ok(())
    }

    /// Started → Running, when the copy loop takes over the application side.
    pub fn mark_running(&mut self) -> Result<(), PassthroughError> {
        self.check(EndpointState::Running)?;
        self.advance(EndpointState::Running);
        Ok(())
    }

    /// Started | Running → Stopped.
    pub fn stop(&mut self) -> Result<(), PassthroughError> {
        self.check(EndpointState::Stopped)?;
        self.driver.stop()?;
        self.advance(EndpointState::Stopped);
        Ok(())
    }

    fn check(&self, next: EndpointState) -> Result<(), PassthroughError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(PassthroughError::InvalidTransition { from: self.state, to: next })
        }
    }

    fn advance(&mut self, next: EndpointState) {
        log::debug!("{}: {:?} -> {:?}", self.driver.name(), self.state, next);
        self.state = next;
    }

    /// The queue, but only while the driver is streaming.
    fn streaming_queue(&self) -> Option<&StreamQueue> {
        if self.state.is_streaming() {
            self.queue.as_deref()
        } else {
            None
        }
    }
}

impl<D: SoundDriver> Endpoint<D, Capture> {
    /// Non-blocking read of whole frames. Returns 0 when idle or not streaming.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        self.streaming_queue().map_or(0, |queue| queue.read(buf))
    }

    /// Read that waits up to `timeout` for the first frame.
    pub fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> usize {
        self.streaming_queue()
            .map_or(0, |queue| queue.read_timeout(buf, timeout))
    }
}

impl<D: SoundDriver> Endpoint<D, Playback> {
    /// Non-blocking write of whole frames. Returns the bytes accepted.
    pub fn write(&self, buf: &[u8]) -> usize {
        self.streaming_queue().map_or(0, |queue| queue.write(buf))
    }
}
