use serde::{Deserialize, Serialize};

use super::error::PassthroughError;

/// Largest channel count a frame may carry.
pub const MAX_CHANNELS: u16 = 2;

/// Widest sample in bytes across all supported formats.
pub const MAX_SAMPLE_WIDTH: usize = 4;

/// Largest frame in bytes (stereo, 4-byte samples).
pub const MAX_FRAME_SIZE: usize = MAX_CHANNELS as usize * MAX_SAMPLE_WIDTH;

/// PCM encodings understood by the pipeline.
///
/// All encodings are little-endian. `Signed24Packed` stores three bytes per
/// sample, `Signed24Padded` stores the same 24-bit value in the low three
/// bytes of a 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    Unsigned8,
    Signed16,
    Signed24Packed,
    Signed24Padded,
}

/// Per-format constants: byte width, precision in bits, stored silence value.
const FORMAT_TABLE: [(SampleFormat, usize, u32, i32); 4] = [
    (SampleFormat::Unsigned8, 1, 8, 1 << 7),
    (SampleFormat::Signed16, 2, 16, 0),
    (SampleFormat::Signed24Packed, 3, 24, 0),
    (SampleFormat::Signed24Padded, 4, 24, 0),
];

/// Resolved constants for a format at a given channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: SampleFormat,
    pub byte_width: usize,
    pub full_scale_factor: i32,
    pub silence_value: i32,
    pub frame_size: usize,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Unsigned8,
        SampleFormat::Signed16,
        SampleFormat::Signed24Packed,
        SampleFormat::Signed24Padded,
    ];

    /// Map a numeric format selector (0..=3) to a format.
    pub fn from_selector(selector: u8) -> Result<Self, PassthroughError> {
        Self::ALL
            .get(selector as usize)
            .copied()
            .ok_or_else(|| PassthroughError::Configuration(format!("unsupported format selector: {}", selector)))
    }

    /// Resolve a selector and channel count to the format's constants.
    pub fn resolve(selector: u8, channels: u16) -> Result<FormatInfo, PassthroughError> {
        let format = Self::from_selector(selector)?;
        FrameLayout::new(format, channels)
            .validate()
            .map_err(PassthroughError::Configuration)?;
        Ok(format.info(channels))
    }

    pub fn info(self, channels: u16) -> FormatInfo {
        FormatInfo {
            format: self,
            byte_width: self.byte_width(),
            full_scale_factor: self.full_scale_factor(),
            silence_value: self.silence_value(),
            frame_size: self.byte_width() * channels as usize,
        }
    }

    pub fn selector(self) -> u8 {
        self as u8
    }

    fn entry(self) -> (SampleFormat, usize, u32, i32) {
        FORMAT_TABLE[self as usize]
    }

    pub fn byte_width(self) -> usize {
        self.entry().1
    }

    /// Bits of precision carried by a sample.
    pub fn bits(self) -> u32 {
        self.entry().2
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, Self::Unsigned8)
    }

    /// `2^(bits-1) - 1`.
    pub fn full_scale_factor(self) -> i32 {
        (1 << (self.bits() - 1)) - 1
    }

    /// Raw stored value of a silent sample: mid-scale when unsigned, zero when signed.
    pub fn silence_value(self) -> i32 {
        self.entry().3
    }

    /// Decode one little-endian sample into a signed value centred on zero.
    ///
    /// `bytes` must hold at least `byte_width()` bytes.
    pub fn decode(self, bytes: &[u8]) -> i32 {
        match self {
            Self::Unsigned8 => bytes[0] as i32 - 128,
            Self::Signed16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            Self::Signed24Packed | Self::Signed24Padded => {
                let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
                ((raw << 8) as i32) >> 8
            }
        }
    }

    /// Encode a zero-centred value, saturating to the format's range.
    ///
    /// `out` must hold at least `byte_width()` bytes.
    pub fn encode(self, value: i32, out: &mut [u8]) {
        let max = self.full_scale_factor();
        let value = value.clamp(-max - 1, max);
        match self {
            Self::Unsigned8 => out[0] = (value + 128) as u8,
            Self::Signed16 => out[..2].copy_from_slice(&(value as i16).to_le_bytes()),
            Self::Signed24Packed => out[..3].copy_from_slice(&value.to_le_bytes()[..3]),
            Self::Signed24Padded => out[..4].copy_from_slice(&value.to_le_bytes()),
        }
    }
}

/// Sample format plus channel count: everything needed to find frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameLayout {
    pub format: SampleFormat,
    pub channels: u16,
}

impl FrameLayout {
    pub fn new(format: SampleFormat, channels: u16) -> Self {
        Self { format, channels }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }

    /// `channels * byte_width`.
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.format.byte_width()
    }

    /// Round a byte count down to a whole number of frames.
    pub fn whole_frames(&self, bytes: usize) -> usize {
        let frame_size = self.frame_size();
        if frame_size == 0 {
            return 0;
        }
        bytes - bytes % frame_size
    }

    /// One frame of silence.
    pub fn silence_frame(&self) -> Vec<u8> {
        let width = self.format.byte_width();
        let mut frame = vec![0u8; self.frame_size()];
        for sample in frame.chunks_exact_mut(width) {
            self.format.encode(0, sample);
        }
        frame
    }
}
