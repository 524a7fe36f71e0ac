//! `passthrough-sim`: run the passthrough pipeline against simulated devices.
//!
//! ```text
//! passthrough-sim [plan.json]
//! ```
//!
//! Logs through `env_logger` (`RUST_LOG`, default `info`) and prints the
//! session summary as JSON on stdout. Exits non-zero when the pipeline cannot
//! be brought up.

use std::path::Path;
use std::process::ExitCode;
use std::thread;

use audio_passthrough_core::{LogActivity, PassthroughError, PassthroughSession};
use audio_passthrough_sim::{SimulatedCapture, SimulatedPlayback, SimulationPlan};
use serde_json::json;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("passthrough-sim failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), PassthroughError> {
    let plan = match std::env::args().nth(1) {
        Some(path) => SimulationPlan::from_json_file(Path::new(&path))?,
        None => SimulationPlan::default(),
    };
    plan.validate().map_err(PassthroughError::Configuration)?;

    let rate = plan.pipeline.sample_rate;
    let capture = SimulatedCapture::new(plan.simulation.clone(), rate);
    let playback = SimulatedPlayback::new(plan.simulation.clone(), rate);
    let capture_stats = capture.stats_handle();
    let playback_stats = playback.stats_handle();

    let mut session = PassthroughSession::new(plan.pipeline.clone());
    session.set_activity(Box::new(LogActivity::new(1000)));
    session.start(capture, playback)?;

    log::info!("passing audio through for {:.1}s", plan.run_secs);
    thread::sleep(plan.run_time());
    let summary = session.stop()?;

    let report = json!({
        "session": summary,
        "capture": *capture_stats.lock(),
        "playback": *playback_stats.lock(),
    });
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| PassthroughError::Configuration(format!("failed to serialize report: {}", e)))?;
    println!("{}", text);
    Ok(())
}
