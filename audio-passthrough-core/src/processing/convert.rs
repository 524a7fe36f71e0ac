//! Sample conversion between the supported PCM layouts.
//!
//! Pure functions over byte slices with no platform dependencies. Drivers use
//! these at the hardware boundary when the device transfers a different
//! layout from the one the pipeline queues.

use crate::models::sample_format::{FrameLayout, SampleFormat};

/// Which source channel feeds a mono destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonoSource {
    #[default]
    Left,
    Right,
}

/// Re-scale a decoded sample from one precision to another.
///
/// The value is left-aligned to 32 bits and shifted back down, so narrowing
/// keeps full scale at full scale and widening pads with zero bits.
pub fn rescale(value: i32, from: SampleFormat, to: SampleFormat) -> i32 {
    let aligned = value << (32 - from.bits());
    aligned >> (32 - to.bits())
}

/// Convert interleaved frames from `from` into `dst` laid out as `to`.
///
/// Mono input is duplicated into both channels of stereo output; stereo input
/// to mono output takes the channel named by `mono_source`. Converts as many
/// whole frames as fit in both buffers and returns that frame count.
pub fn convert_frames(
    src: &[u8],
    from: FrameLayout,
    dst: &mut [u8],
    to: FrameLayout,
    mono_source: MonoSource,
) -> usize {
    let in_frame = from.frame_size();
    let out_frame = to.frame_size();
    if in_frame == 0 || out_frame == 0 {
        return 0;
    }

    let in_width = from.format.byte_width();
    let out_width = to.format.byte_width();
    let frames = (src.len() / in_frame).min(dst.len() / out_frame);

    for (src_frame, dst_frame) in src
        .chunks_exact(in_frame)
        .zip(dst.chunks_exact_mut(out_frame))
        .take(frames)
    {
        for (ch, out) in dst_frame.chunks_exact_mut(out_width).enumerate() {
            let src_ch = if from.channels == to.channels {
                ch
            } else if from.channels == 1 {
                0
            } else {
                match mono_source {
                    MonoSource::Left => 0,
                    MonoSource::Right => 1,
                }
            };
            let value = from.format.decode(&src_frame[src_ch * in_width..]);
            to.format.encode(rescale(value, from.format, to.format), out);
        }
    }
    frames
}

/// Peak absolute level of interleaved samples, 0.0–1.0 of full scale.
pub fn peak_level(bytes: &[u8], layout: FrameLayout) -> f32 {
    let format = layout.format;
    let full_scale = format.full_scale_factor() as f32;
    bytes
        .chunks_exact(format.byte_width())
        .map(|sample| (format.decode(sample).unsigned_abs() as f32 / full_scale).min(1.0))
        .fold(0.0f32, f32::max)
}
