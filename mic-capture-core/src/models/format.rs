use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::NatMicError;

/// Bits per PCM sample written by the recorder.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Sample rate and channel layout of an audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channel_count: u16) -> Self {
        Self {
            sample_rate,
            channel_count,
        }
    }

    /// Mono microphone format at the host output rate.
    pub fn for_microphone(output_sample_rate: u32) -> Self {
        Self::new(output_sample_rate, 1)
    }

    /// Mixing format: host output rate with the host speaker channel count.
    pub fn for_mixing(output_sample_rate: u32, speaker_channels: u16) -> Self {
        Self::new(output_sample_rate, speaker_channels)
    }

    pub fn validate(&self) -> Result<(), NatMicError> {
        if self.sample_rate == 0 {
            return Err(NatMicError::InvalidFormat("sample rate must be positive".into()));
        }
        if self.channel_count == 0 {
            return Err(NatMicError::InvalidFormat("channel count must be positive".into()));
        }
        Ok(())
    }

    /// Bytes per second of 16-bit PCM in this format.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channel_count as u32 * (BITS_PER_SAMPLE / 8) as u32
    }

    /// Bytes per interleaved frame of 16-bit PCM.
    pub fn block_align(&self) -> u16 {
        self.channel_count * (BITS_PER_SAMPLE / 8)
    }

    /// Duration of `total_samples` interleaved samples, in seconds.
    pub fn duration_secs(&self, total_samples: u64) -> f64 {
        if self.sample_rate == 0 || self.channel_count == 0 {
            return 0.0;
        }
        total_samples as f64 / (self.sample_rate as f64 * self.channel_count as f64)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {}@{}Hz }}", self.channel_count, self.sample_rate)
    }
}
