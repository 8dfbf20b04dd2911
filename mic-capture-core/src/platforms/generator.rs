//! Software signal source standing in for a microphone or an engine-audio tap.
//!
//! Delivers a sine tone (or silence) in fixed-size interleaved buffers on a
//! dedicated thread, paced against the wall clock like a hardware device.

use std::f64::consts::TAU;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::GeneratorConfig;
use crate::models::error::NatMicError;
use crate::models::event::{invoke_callback, SampleBufferCallback, SampleEvent};
use crate::models::format::AudioFormat;
use crate::traits::engine_tap::EngineAudioTap;
use crate::traits::microphone_backend::MicrophoneBackend;

type CallbackSlot = Arc<Mutex<Option<SampleBufferCallback>>>;

/// Microphone backend producing a generated signal.
pub struct GeneratorBackend {
    config: GeneratorConfig,
    recording_path: PathBuf,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GeneratorBackend {
    pub fn new(config: GeneratorConfig, recording_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            recording_path: recording_path.into(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl MicrophoneBackend for GeneratorBackend {
    fn is_recording(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn recording_path(&self) -> PathBuf {
        self.recording_path.clone()
    }

    fn start_recording(&mut self, format: AudioFormat, callback: SampleBufferCallback) -> Result<(), NatMicError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(NatMicError::AlreadyRecording);
        }
        format.validate()?;
        self.config.validate().map_err(NatMicError::InvalidFormat)?;

        self.running.store(true, Ordering::SeqCst);
        let signal = SignalLoop {
            format,
            config: self.config.clone(),
            callback: Arc::new(Mutex::new(Some(callback))),
            running: Arc::clone(&self.running),
            lifecycle_events: true,
        };
        let handle = thread::Builder::new()
            .name("generator-mic".into())
            .spawn(move || signal.run())
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                NatMicError::Spawn(e.to_string())
            })?;

        self.handle = Some(handle);
        log::info!("Generator microphone started at {}", format);
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), NatMicError> {
        if !self.running.swap(false, Ordering::SeqCst) && self.handle.is_none() {
            return Err(NatMicError::NotRecording);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Generator microphone thread panicked");
            }
        }
        log::info!("Generator microphone stopped");
        Ok(())
    }
}

impl Drop for GeneratorBackend {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop_recording();
        }
    }
}

/// Engine-audio tap producing a generated signal at the engine format.
pub struct GeneratorTap {
    format: AudioFormat,
    config: GeneratorConfig,
    callback: CallbackSlot,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl GeneratorTap {
    pub fn new(format: AudioFormat, config: GeneratorConfig) -> Self {
        Self {
            format,
            config,
            callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_installed(&self) -> bool {
        self.callback.lock().is_some()
    }
}

impl EngineAudioTap for GeneratorTap {
    fn install(&self, callback: SampleBufferCallback) {
        *self.callback.lock() = Some(callback);
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let signal = SignalLoop {
            format: self.format,
            config: self.config.clone(),
            callback: Arc::clone(&self.callback),
            running: Arc::clone(&self.running),
            lifecycle_events: false,
        };
        match thread::Builder::new()
            .name("generator-tap".into())
            .spawn(move || signal.run())
        {
            Ok(handle) => *self.handle.lock() = Some(handle),
            Err(e) => {
                log::error!("Failed to spawn generator tap thread: {}", e);
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    fn remove(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.callback.lock() = None;
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for GeneratorTap {
    fn drop(&mut self) {
        self.remove();
    }
}

/// State owned by a generator thread.
struct SignalLoop {
    format: AudioFormat,
    config: GeneratorConfig,
    callback: CallbackSlot,
    running: Arc<AtomicBool>,
    lifecycle_events: bool,
}

impl SignalLoop {
    fn run(self) {
        let rate = self.format.sample_rate as f64;
        let channels = self.format.channel_count as usize;
        let frames = self.config.buffer_frames;
        let step = TAU * self.config.frequency_hz as f64 / rate;

        let mut buffer = vec![0.0f32; frames * channels];
        let mut phase = 0.0f64;
        let mut frames_delivered = 0u64;
        let mut buffers_delivered = 0u64;
        let started = Instant::now();

        if self.lifecycle_events {
            self.emit(SampleEvent::Initialize);
        }

        while self.running.load(Ordering::SeqCst) {
            if self.config.max_buffers.is_some_and(|max| buffers_delivered >= max) {
                thread::sleep(Duration::from_millis(2));
                continue;
            }

            for frame in buffer.chunks_exact_mut(channels) {
                let sample = if step > 0.0 {
                    (self.config.amplitude as f64 * phase.sin()) as f32
                } else {
                    0.0
                };
                frame.fill(sample);
                phase = (phase + step) % TAU;
            }

            let timestamp_nanos = (frames_delivered as f64 * 1e9 / rate) as i64;
            self.emit(SampleEvent::Data {
                samples: &buffer,
                timestamp_nanos,
            });
            frames_delivered += frames as u64;
            buffers_delivered += 1;

            if self.config.realtime {
                let due = started + Duration::from_secs_f64(frames_delivered as f64 / rate);
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
            } else {
                thread::yield_now();
            }
        }

        if self.lifecycle_events {
            self.emit(SampleEvent::Finalize);
        }
    }

    fn emit(&self, event: SampleEvent<'_>) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            invoke_callback(&callback, event, self.format);
        }
    }
}
