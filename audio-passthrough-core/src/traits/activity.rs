/// Liveness indicator ticked once per copy-loop iteration.
///
/// Purely observational: nothing it does may affect the data path.
pub trait ActivityIndicator: Send {
    fn tick(&mut self, iteration: u64);
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActivity;

impl ActivityIndicator for NoActivity {
    fn tick(&mut self, _iteration: u64) {}
}

/// Logs a spinning rotor at `trace` level every `every` iterations.
#[derive(Debug, Clone)]
pub struct LogActivity {
    every: u64,
    turns: u64,
}

const ROTOR: [char; 4] = ['|', '/', '-', '\\'];

impl LogActivity {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1), turns: 0 }
    }

    /// Rotor glyph shown at the last tick.
    pub fn glyph(&self) -> char {
        ROTOR[(self.turns % ROTOR.len() as u64) as usize]
    }
}

impl ActivityIndicator for LogActivity {
    fn tick(&mut self, iteration: u64) {
        if iteration % self.every == 0 {
            self.turns += 1;
            log::trace!("{} iteration {}", self.glyph(), iteration);
        }
    }
}
