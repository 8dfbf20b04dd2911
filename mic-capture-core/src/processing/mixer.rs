use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::MixerStats;
use crate::models::config::MixerConfig;
use crate::models::error::NatMicError;
use crate::models::event::{invoke_callback, SampleBufferCallback, SampleEvent};
use crate::models::format::AudioFormat;
use crate::models::state::MixerState;
use crate::processing::mixing;
use crate::processing::ring_buffer::RingBuffer;

#[derive(Debug)]
struct Shared {
    state: MixerState,
    stats: MixerStats,
}

/// Background mixer merging a mono microphone stream with an interleaved
/// engine-audio stream.
///
/// ```text
/// [microphone] → [mic RingBuffer] ───┐
///                                     ├→ mix → SampleEvent::Data → callback
/// [engine audio] → [engine RingBuffer]┘
/// ```
///
/// The mixer thread is the only consumer of both buffers and the only producer
/// of the merged stream; the callback runs on it. It emits `Initialize` once,
/// a `Data` event per mixed block, and `Finalize` after [`dispose`](Self::dispose).
pub struct AudioMixer {
    format: AudioFormat,
    mic_buffer: Arc<RingBuffer>,
    engine_buffer: Arc<RingBuffer>,
    running: Arc<AtomicBool>,
    shared: Arc<Mutex<Shared>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AudioMixer {
    /// Create the ring buffers and start the mixer thread.
    pub fn new(format: AudioFormat, config: MixerConfig, callback: SampleBufferCallback) -> Result<Self, NatMicError> {
        format.validate()?;
        config
            .validate(format.channel_count)
            .map_err(NatMicError::InvalidFormat)?;

        let mic_buffer = Arc::new(RingBuffer::new(config.ring_capacity));
        let engine_buffer = Arc::new(RingBuffer::new(config.ring_capacity));
        let running = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(Mutex::new(Shared {
            state: MixerState::Idle,
            stats: MixerStats::default(),
        }));

        let worker = MixerLoop {
            format,
            config,
            callback,
            mic_buffer: Arc::clone(&mic_buffer),
            engine_buffer: Arc::clone(&engine_buffer),
            running: Arc::clone(&running),
            shared: Arc::clone(&shared),
        };

        let handle = thread::Builder::new()
            .name("audio-mixer".into())
            .spawn(move || worker.run())
            .map_err(|e| NatMicError::Spawn(e.to_string()))?;

        log::debug!("Audio mixer started at {}", format);

        Ok(Self {
            format,
            mic_buffer,
            engine_buffer,
            running,
            shared,
            handle: Some(handle),
        })
    }

    /// Format of the merged stream.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn state(&self) -> MixerState {
        self.shared.lock().state
    }

    pub fn stats(&self) -> MixerStats {
        self.shared.lock().stats
    }

    /// Feed a microphone event. Only `Data` samples are buffered; multi-channel
    /// input is downmixed to mono first.
    pub fn on_microphone_event(&self, event: SampleEvent<'_>, format: AudioFormat) {
        write_microphone(&self.mic_buffer, &self.shared, event, format);
    }

    /// Feed an engine-audio event. Only `Data` samples are buffered.
    pub fn on_engine_event(&self, event: SampleEvent<'_>, format: AudioFormat) {
        write_engine(&self.engine_buffer, &self.shared, self.format, event, format);
    }

    /// Callback bound to [`on_microphone_event`](Self::on_microphone_event),
    /// for handing to a microphone backend.
    pub fn microphone_callback(&self) -> SampleBufferCallback {
        let buffer = Arc::clone(&self.mic_buffer);
        let shared = Arc::clone(&self.shared);
        Arc::new(move |event, format| write_microphone(&buffer, &shared, event, format))
    }

    /// Callback bound to [`on_engine_event`](Self::on_engine_event), for
    /// installing on an engine-audio tap.
    pub fn engine_callback(&self) -> SampleBufferCallback {
        let buffer = Arc::clone(&self.engine_buffer);
        let shared = Arc::clone(&self.shared);
        let mix_format = self.format;
        Arc::new(move |event, format| write_engine(&buffer, &shared, mix_format, event, format))
    }

    /// Ask the mixer thread to stop. Returns immediately; the thread exits at
    /// its next iteration and emits `Finalize`.
    pub fn dispose(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("Audio mixer stop requested");
        }
    }

    /// Dispose and wait for the mixer thread to emit `Finalize` and exit.
    pub fn join(&mut self) {
        self.dispose();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Audio mixer thread panicked");
            }
        }
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn write_microphone(buffer: &RingBuffer, shared: &Mutex<Shared>, event: SampleEvent<'_>, format: AudioFormat) {
    let Some(samples) = event.samples() else {
        return;
    };
    let written = if format.channel_count > 1 {
        let mono = mixing::downmix_to_mono(samples, format.channel_count as usize);
        buffer.write(&mono);
        mono.len()
    } else {
        buffer.write(samples);
        samples.len()
    };
    shared.lock().stats.mic_samples_received += written as u64;
}

fn write_engine(
    buffer: &RingBuffer,
    shared: &Mutex<Shared>,
    mix_format: AudioFormat,
    event: SampleEvent<'_>,
    format: AudioFormat,
) {
    let Some(samples) = event.samples() else {
        return;
    };
    if format.channel_count != mix_format.channel_count {
        log::warn!(
            "Engine audio delivered {} but mixer expects {}; dropping buffer",
            format,
            mix_format
        );
        return;
    }
    buffer.write(samples);
    shared.lock().stats.engine_samples_received += samples.len() as u64;
}

/// State owned by the mixer thread.
struct MixerLoop {
    format: AudioFormat,
    config: MixerConfig,
    callback: SampleBufferCallback,
    mic_buffer: Arc<RingBuffer>,
    engine_buffer: Arc<RingBuffer>,
    running: Arc<AtomicBool>,
    shared: Arc<Mutex<Shared>>,
}

impl MixerLoop {
    fn run(self) {
        let channels = self.format.channel_count as usize;
        let block_size = self.config.block_size;
        let engine_block = block_size * channels;
        let block_duration_ns = 1e9 * block_size as f64 / self.format.sample_rate as f64;

        let mut engine_staging = Vec::with_capacity(engine_block);
        let mut mic_staging = Vec::with_capacity(block_size);
        let mut mic_expanded = Vec::with_capacity(engine_block);
        let mut mixed = vec![0.0f32; engine_block];
        let mut timestamp = 0.0f64;

        self.set_state(MixerState::Running);
        invoke_callback(&self.callback, SampleEvent::Initialize, self.format);

        loop {
            thread::sleep(self.config.poll_interval);

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            if self.engine_buffer.available_samples() < engine_block as u64
                || self.mic_buffer.available_samples() < block_size as u64
            {
                self.shared.lock().stats.starved_ticks += 1;
                continue;
            }

            if let Err(e) = self
                .engine_buffer
                .read(&mut engine_staging, engine_block)
                .and_then(|_| self.mic_buffer.read(&mut mic_staging, block_size))
            {
                log::error!("Mixer read failed: {}", e);
                continue;
            }

            let mic_block: &[f32] = if channels > 1 {
                mixing::repeat(&mic_staging, &mut mic_expanded, channels);
                &mic_expanded
            } else {
                &mic_staging
            };
            mixing::mix(&engine_staging, mic_block, &mut mixed);

            timestamp += block_duration_ns;
            {
                let mut s = self.shared.lock();
                s.stats.mix_cycles += 1;
                s.stats.levels.mic_level = mixing::rms_level(&mic_staging);
                s.stats.levels.peak_mic_level = mixing::peak_level(&mic_staging);
                s.stats.levels.engine_level = mixing::rms_level(&engine_staging);
                s.stats.levels.peak_engine_level = mixing::peak_level(&engine_staging);
            }

            invoke_callback(
                &self.callback,
                SampleEvent::Data {
                    samples: &mixed,
                    timestamp_nanos: timestamp as i64,
                },
                self.format,
            );

            self.realign(block_size, engine_block);
        }

        self.set_state(MixerState::Draining);
        invoke_callback(&self.callback, SampleEvent::Finalize, self.format);
        self.set_state(MixerState::Stopped);
        log::debug!("Audio mixer stopped");
    }

    /// Trim a buffer whose backlog has grown past the configured bound, so
    /// that clock drift between the two sources stays bounded.
    fn realign(&self, mic_block: usize, engine_block: usize) {
        let Some(max_blocks) = self.config.max_backlog_blocks else {
            return;
        };
        for (name, buffer, block) in [
            ("microphone", &self.mic_buffer, mic_block),
            ("engine", &self.engine_buffer, engine_block),
        ] {
            let limit = (max_blocks * block) as u64;
            let available = buffer.available_samples();
            if available > limit {
                let skipped = buffer.skip((available - limit) as usize);
                log::warn!("Realigned {} buffer: dropped {} samples", name, skipped);
                self.shared.lock().stats.realigned_samples += skipped as u64;
            }
        }
    }

    fn set_state(&self, state: MixerState) {
        self.shared.lock().state = state;
    }
}
