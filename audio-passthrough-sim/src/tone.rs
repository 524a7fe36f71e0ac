use std::f64::consts::TAU;

use audio_passthrough_core::FrameLayout;

/// Sine generator writing interleaved frames, same value on every channel.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    phase: f64,
    step: f64,
    amplitude: f64,
}

impl ToneGenerator {
    pub fn new(frequency: f64, amplitude: f64, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate.max(1) as f64,
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }

    /// Fill `out` with whole frames in `layout`. Returns frames written.
    pub fn fill(&mut self, out: &mut [u8], layout: FrameLayout) -> usize {
        let frame_size = layout.frame_size();
        if frame_size == 0 {
            return 0;
        }
        let width = layout.format.byte_width();
        let full_scale = layout.format.full_scale_factor() as f64;

        let mut frames = 0;
        for frame in out.chunks_exact_mut(frame_size) {
            let value = (self.phase.sin() * self.amplitude * full_scale).round() as i32;
            for sample in frame.chunks_exact_mut(width) {
                layout.format.encode(value, sample);
            }
            self.phase = (self.phase + self.step) % TAU;
            frames += 1;
        }
        frames
    }
}
