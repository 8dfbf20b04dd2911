/// Real-time level metering of the last mixed block (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub mic_level: f32,
    pub engine_level: f32,
    pub peak_mic_level: f32,
    pub peak_engine_level: f32,
}

/// Diagnostics for a mixing session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MixerStats {
    pub mix_cycles: u64,
    pub starved_ticks: u64,
    pub mic_samples_received: u64,
    pub engine_samples_received: u64,
    pub realigned_samples: u64,
    pub levels: AudioLevels,
}
