mod common;

use std::sync::Arc;

use audio_passthrough_core::{
    AllocError, CaptureEndpoint, CopyLoop, EndpointState, IterationOutcome, PassthroughConfiguration,
    PassthroughError, PipelineBootstrap, PollMode, SampleFormat, Severity, StreamQueue,
};
use common::{started_queue, stereo16, EventLog, QueueSlot, RecordingSink, ScriptedDriver};

struct Harness {
    copy_loop: CopyLoop<ScriptedDriver, ScriptedDriver>,
    capture: QueueSlot,
    playback: QueueSlot,
    sink: Arc<RecordingSink>,
    events: EventLog,
}

fn busy_poll() -> PassthroughConfiguration {
    PassthroughConfiguration {
        poll_mode: PollMode::BusyPoll,
        ..Default::default()
    }
}

fn bootstrap(config: PassthroughConfiguration) -> Harness {
    let events = EventLog::default();
    let capture = ScriptedDriver::capture(&events);
    let playback = ScriptedDriver::playback(&events);
    let (capture_slot, playback_slot) = (Arc::clone(&capture.slot), Arc::clone(&playback.slot));
    let sink = Arc::new(RecordingSink::default());

    let copy_loop = PipelineBootstrap::new(config, sink.clone()).run(capture, playback).unwrap();
    Harness {
        copy_loop,
        capture: capture_slot,
        playback: playback_slot,
        sink,
        events,
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn queue_of_100ms_stereo16_at_48k_holds_19200_bytes() {
    assert_eq!(StreamQueue::capacity_for(100, 48_000, stereo16()), Some(19_200));

    let harness = bootstrap(busy_poll());
    assert_eq!(started_queue(&harness.capture).capacity(), 19_200);
    assert_eq!(started_queue(&harness.playback).capacity(), 19_200);
    assert_eq!(started_queue(&harness.playback).capacity_frames(), 4_800);
}

#[test]
fn one_chunk_moves_unchanged_without_warnings() {
    let mut harness = bootstrap(busy_poll());
    let data = pattern(4000);
    assert_eq!(started_queue(&harness.capture).write(&data), 4000);

    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Copied { bytes: 4000 });

    let playback = started_queue(&harness.playback);
    assert_eq!(playback.available(), 4000);
    let mut out = vec![0u8; 4000];
    assert_eq!(playback.read(&mut out), 4000);
    assert_eq!(out, data);

    assert_eq!(harness.sink.count(Severity::Warning), 0);
    assert_eq!(started_queue(&harness.capture).available(), 0);
}

#[test]
fn short_playback_write_drops_remainder_with_one_warning() {
    let mut harness = bootstrap(busy_poll());
    let playback = started_queue(&harness.playback);
    assert_eq!(playback.write(&vec![0u8; 16_200]), 16_200);
    started_queue(&harness.capture).write(&pattern(4000));

    assert_eq!(
        harness.copy_loop.run_iteration(),
        IterationOutcome::Dropped { read: 4000, written: 3000 }
    );
    assert_eq!(playback.available(), 19_200);

    let warnings = harness.sink.messages(Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("sound data dropped"));

    let d = harness.copy_loop.diagnostics();
    assert_eq!(d.bytes_dropped, 1000);
    assert_eq!(d.short_writes, 1);

    // The loop keeps going once the consumer catches up.
    playback.reset();
    started_queue(&harness.capture).write(&pattern(4000));
    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Copied { bytes: 4000 });
    assert_eq!(harness.sink.count(Severity::Warning), 1);
}

#[test]
fn capture_allocation_failure_is_fatal_before_any_start() {
    let events = EventLog::default();
    let mut capture = ScriptedDriver::capture(&events);
    capture.fail_alloc = true;
    let playback = ScriptedDriver::playback(&events);
    let sink = Arc::new(RecordingSink::default());

    let err = PipelineBootstrap::new(busy_poll(), sink.clone())
        .run(capture, playback)
        .err()
        .unwrap();

    assert_eq!(err, PassthroughError::Alloc(AllocError::InsufficientMemory { requested: 19_200 }));
    let panics = sink.messages(Severity::Panic);
    assert_eq!(panics.len(), 1);
    assert!(panics[0].starts_with("cannot allocate input sound queue"));
    assert_eq!(*events.lock(), vec!["capture:allocate"]);
}

#[test]
fn playback_allocation_failure_names_output_queue() {
    let events = EventLog::default();
    let capture = ScriptedDriver::capture(&events);
    let mut playback = ScriptedDriver::playback(&events);
    playback.fail_alloc = true;
    let sink = Arc::new(RecordingSink::default());

    let result = PipelineBootstrap::new(busy_poll(), sink.clone()).run(capture, playback);

    assert!(matches!(result, Err(PassthroughError::Alloc(_))));
    assert!(sink.messages(Severity::Panic)[0].starts_with("cannot allocate output sound queue"));
    assert!(!events.lock().iter().any(|e| e.ends_with(":start")));
}

#[test]
fn bootstrap_steps_run_in_order() {
    let harness = bootstrap(busy_poll());
    assert_eq!(
        *harness.events.lock(),
        vec![
            "capture:allocate",
            "capture:set_format",
            "playback:allocate",
            "playback:set_format",
            "capture:start",
            "playback:start",
        ]
    );
    assert_eq!(harness.sink.count(Severity::Notice), 6);
    assert!(harness.sink.tags().iter().all(|t| t == "passthrough"));
    assert_eq!(harness.copy_loop.capture().state(), EndpointState::Running);
    assert_eq!(harness.copy_loop.playback().state(), EndpointState::Running);
}

#[test]
fn playback_start_failure_stops_capture() {
    let events = EventLog::default();
    let capture = ScriptedDriver::capture(&events);
    let capture_slot = Arc::clone(&capture.slot);
    let mut playback = ScriptedDriver::playback(&events);
    playback.fail_start = true;
    let sink = Arc::new(RecordingSink::default());

    let result = PipelineBootstrap::new(busy_poll(), sink.clone()).run(capture, playback);

    assert!(matches!(result, Err(PassthroughError::StartFailed { .. })));
    assert_eq!(events.lock().last().map(String::as_str), Some("capture:stop"));
    assert!(capture_slot.lock().is_none());
    assert!(sink.messages(Severity::Panic)[0].starts_with("cannot start output sound device"));
}

#[test]
fn invalid_configuration_touches_no_driver() {
    let events = EventLog::default();
    let sink = Arc::new(RecordingSink::default());
    let config = PassthroughConfiguration {
        channels: 3,
        ..busy_poll()
    };

    let result = PipelineBootstrap::new(config, sink.clone())
        .run(ScriptedDriver::capture(&events), ScriptedDriver::playback(&events));

    assert!(matches!(result, Err(PassthroughError::Configuration(_))));
    assert!(events.lock().is_empty());
    assert_eq!(sink.count(Severity::Panic), 1);
}

#[test]
fn idle_iterations_leave_queues_untouched() {
    let mut harness = bootstrap(busy_poll());
    let playback = started_queue(&harness.playback);
    playback.write(&pattern(800));

    for _ in 0..5 {
        assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Idle);
    }

    assert_eq!(playback.available(), 800);
    let d = harness.copy_loop.diagnostics();
    assert_eq!(d.iterations, 5);
    assert_eq!(d.idle_polls, 5);
    assert_eq!(d.bytes_written, 0);
    assert_eq!(harness.sink.count(Severity::Warning), 0);
}

#[test]
fn partial_frames_stay_queued_until_complete() {
    let mut harness = bootstrap(busy_poll());
    let capture = started_queue(&harness.capture);
    // Three bytes is less than one stereo 16-bit frame.
    assert_eq!(capture.write(&[1, 2, 3]), 0);
    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Idle);
}

#[test]
fn suspend_mode_times_out_on_empty_capture() {
    let config = PassthroughConfiguration {
        poll_mode: PollMode::Suspend { timeout_ms: 2 },
        ..Default::default()
    };
    let mut harness = bootstrap(config);
    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Idle);
}

#[test]
fn start_before_format_is_invalid_transition() {
    let events = EventLog::default();
    let mut endpoint = CaptureEndpoint::new(ScriptedDriver::capture(&events)).unwrap();
    endpoint.allocate_queue(100, stereo16()).unwrap();

    let err = endpoint.start().unwrap_err();
    assert_eq!(
        err,
        PassthroughError::InvalidTransition {
            from: EndpointState::QueueAllocated,
            to: EndpointState::Started,
        }
    );
    assert!(!events.lock().contains(&"capture:start".to_string()));
}

#[test]
fn mono_8bit_pipeline_moves_whole_frames() {
    let config = PassthroughConfiguration {
        channels: 1,
        format: SampleFormat::Unsigned8,
        chunk_frames: 10,
        ..busy_poll()
    };
    let mut harness = bootstrap(config);
    assert_eq!(harness.copy_loop.chunk_bytes(), 10);
    started_queue(&harness.capture).write(&[0x80; 25]);

    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Copied { bytes: 10 });
    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Copied { bytes: 10 });
    assert_eq!(harness.copy_loop.run_iteration(), IterationOutcome::Copied { bytes: 5 });
    assert_eq!(harness.copy_loop.diagnostics().peak_level, 0.0);
}

fn rate_mismatch(capture_rate: u32, playback_rate: u32, config_rate: u32) -> (PassthroughError, Arc<RecordingSink>, EventLog) {
    let events = EventLog::default();
    let mut capture = ScriptedDriver::capture(&events);
    capture.rate = capture_rate;
    let mut playback = ScriptedDriver::playback(&events);
    playback.rate = playback_rate;
    let sink = Arc::new(RecordingSink::default());
    let config = PassthroughConfiguration {
        sample_rate: config_rate,
        ..busy_poll()
    };

    let err = PipelineBootstrap::new(config, sink.clone())
        .run(capture, playback)
        .err()
        .unwrap();
    (err, sink, events)
}

#[test]
fn capture_rate_differing_from_configuration_is_fatal() {
    let (err, sink, events) = rate_mismatch(48_000, 8_000, 8_000);

    assert!(matches!(err, PassthroughError::Configuration(_)));
    let panics = sink.messages(Severity::Panic);
    assert_eq!(panics.len(), 1);
    assert!(panics[0].starts_with("input sound device rate mismatch"));
    assert!(events.lock().is_empty());
}

#[test]
fn playback_rate_differing_from_capture_is_fatal() {
    let (err, sink, events) = rate_mismatch(48_000, 44_100, 48_000);

    assert!(matches!(err, PassthroughError::Configuration(_)));
    assert!(sink.messages(Severity::Panic)[0].starts_with("output sound device rate mismatch"));
    assert!(events.lock().is_empty());
}

#[test]
fn queues_are_sized_at_the_configured_rate() {
    let events = EventLog::default();
    let mut capture = ScriptedDriver::capture(&events);
    capture.rate = 8_000;
    let mut playback = ScriptedDriver::playback(&events);
    playback.rate = 8_000;
    let (capture_slot, playback_slot) = (Arc::clone(&capture.slot), Arc::clone(&playback.slot));
    let config = PassthroughConfiguration {
        sample_rate: 8_000,
        ..busy_poll()
    };

    let _copy_loop = PipelineBootstrap::new(config, Arc::new(RecordingSink::default()))
        .run(capture, playback)
        .unwrap();

    assert_eq!(started_queue(&capture_slot).capacity(), 3_200);
    assert_eq!(started_queue(&playback_slot).capacity(), 3_200);
}
