use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use audio_passthrough_core::PassthroughError;

/// Thread that calls a handler once per period, standing in for a DMA interrupt.
///
/// Deadlines accumulate from the start time, so a slow handler is caught up
/// on the following periods instead of drifting.
pub struct PeriodicWorker {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PeriodicWorker {
    pub fn spawn(
        name: &str,
        period: Duration,
        mut handler: impl FnMut() + Send + 'static,
    ) -> Result<Self, PassthroughError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while flag.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    handler();
                    next += period;
                }
            })
            .map_err(|e| PassthroughError::Thread(format!("failed to spawn {} thread: {}", name, e)))?;

        Ok(Self { running, handle: Some(handle) })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the thread and wait for the current period to finish.
    pub fn stop(&mut self) -> Result<(), PassthroughError> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PassthroughError::Thread("interrupt thread panicked".into())),
            None => Ok(()),
        }
    }
}

impl Drop for PeriodicWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{}", e);
        }
    }
}
