use std::time::Duration;

/// Configuration for an overlay mixing session.
#[derive(Debug, Clone, PartialEq)]
pub struct MixerConfig {
    /// Frames mixed per iteration (default: 512).
    pub block_size: usize,

    /// Sleep between loop iterations (default: 3ms).
    pub poll_interval: Duration,

    /// Capacity of each ring buffer in samples (default: 65536).
    pub ring_capacity: usize,

    /// Backlog, in blocks, above which a ring buffer is trimmed to realign the
    /// two sources (default: 8). `None` disables realignment.
    pub max_backlog_blocks: Option<usize>,
}

impl MixerConfig {
    pub fn validate(&self, channel_count: u16) -> Result<(), String> {
        if self.block_size == 0 {
            return Err("block size must be positive".into());
        }
        if self.poll_interval.is_zero() {
            return Err("poll interval must be positive".into());
        }
        let engine_block = self.block_size * channel_count.max(1) as usize;
        if self.ring_capacity < engine_block {
            return Err(format!(
                "ring capacity {} cannot hold one block of {} samples",
                self.ring_capacity, engine_block
            ));
        }
        if self.max_backlog_blocks == Some(0) {
            return Err("max backlog must be at least one block".into());
        }
        Ok(())
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            poll_interval: Duration::from_millis(3),
            ring_capacity: 1 << 16,
            max_backlog_blocks: Some(8),
        }
    }
}

/// Configuration for the software signal generator backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Tone frequency in Hz. `0.0` produces silence.
    pub frequency_hz: f32,

    /// Peak amplitude, expected within `[0.0, 1.0]` (default: 0.25).
    pub amplitude: f32,

    /// Frames per delivered buffer (default: 480, 10ms at 48kHz).
    pub buffer_frames: usize,

    /// Pace deliveries in real time. When false, buffers are produced as fast
    /// as the consumer accepts them (default: true).
    pub realtime: bool,

    /// Stop producing after this many buffers and idle until stopped
    /// (default: None, unlimited).
    pub max_buffers: Option<u64>,
}

impl GeneratorConfig {
    pub fn silence() -> Self {
        Self {
            frequency_hz: 0.0,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_frames == 0 {
            return Err("buffer frames must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(format!("amplitude out of range: {}", self.amplitude));
        }
        if self.frequency_hz < 0.0 {
            return Err(format!("negative frequency: {}", self.frequency_hz));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            amplitude: 0.25,
            buffer_frames: 480,
            realtime: true,
            max_buffers: None,
        }
    }
}
