#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use audio_passthrough_core::{
    ActivityIndicator, AllocError, DiagnosticSink, FrameLayout, PassthroughError, SampleFormat, Severity,
    SoundDriver, StreamDirection, StreamQueue,
};
use parking_lot::Mutex;

pub type EventLog = Arc<Mutex<Vec<String>>>;
pub type QueueSlot = Arc<Mutex<Option<Arc<StreamQueue>>>>;

pub fn stereo16() -> FrameLayout {
    FrameLayout::new(SampleFormat::Signed16, 2)
}

/// Driver double that records every call into a shared log and exposes the
/// queue it was started with, so tests can play the hardware side.
pub struct ScriptedDriver {
    name: String,
    direction: StreamDirection,
    pub rate: u32,
    pub events: EventLog,
    pub slot: QueueSlot,
    pub fail_alloc: bool,
    pub fail_start: bool,
}

impl ScriptedDriver {
    pub fn capture(events: &EventLog) -> Self {
        Self::new("capture", StreamDirection::Capture, events)
    }

    pub fn playback(events: &EventLog) -> Self {
        Self::new("playback", StreamDirection::Playback, events)
    }

    fn new(name: &str, direction: StreamDirection, events: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            direction,
            rate: 48_000,
            events: Arc::clone(events),
            slot: Arc::new(Mutex::new(None)),
            fail_alloc: false,
            fail_start: false,
        }
    }

    fn record(&self, call: &str) {
        self.events.lock().push(format!("{}:{}", self.name, call));
    }
}

impl SoundDriver for ScriptedDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> StreamDirection {
        self.direction
    }

    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn allocate_queue(&mut self, duration_ms: u32, layout: FrameLayout) -> Result<Arc<StreamQueue>, AllocError> {
        self.record("allocate");
        if self.fail_alloc {
            let requested = StreamQueue::capacity_for(duration_ms, self.sample_rate(), layout).unwrap_or(u64::MAX);
            return Err(AllocError::InsufficientMemory { requested });
        }
        StreamQueue::allocate(duration_ms, self.sample_rate(), layout).map(Arc::new)
    }

    fn set_format(&mut self, _layout: FrameLayout) -> Result<(), PassthroughError> {
        self.record("set_format");
        Ok(())
    }

    fn start(&mut self, queue: Arc<StreamQueue>) -> Result<(), PassthroughError> {
        self.record("start");
        if self.fail_start {
            return Err(PassthroughError::StartFailed {
                device: self.name.clone(),
                reason: "device busy".into(),
            });
        }
        *self.slot.lock() = Some(queue);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PassthroughError> {
        self.record("stop");
        self.slot.lock().take();
        Ok(())
    }
}

/// Queue a started driver was handed. Panics if the driver is not streaming.
pub fn started_queue(slot: &QueueSlot) -> Arc<StreamQueue> {
    slot.lock().clone().expect("driver not started")
}

#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, Severity, String)>>,
}

impl RecordingSink {
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, s, _)| *s == severity)
            .map(|(_, _, m)| m.clone())
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages(severity).len()
    }

    pub fn tags(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(t, _, _)| t.clone()).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn write(&self, tag: &str, severity: Severity, message: &str) {
        self.entries.lock().push((tag.to_string(), severity, message.to_string()));
    }
}

/// Activity indicator that counts ticks.
pub struct CountingActivity(pub Arc<Mutex<u64>>);

impl ActivityIndicator for CountingActivity {
    fn tick(&mut self, _iteration: u64) {
        *self.0.lock() += 1;
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
