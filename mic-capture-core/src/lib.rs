//! # mic-capture-core
//!
//! Microphone recording pipeline for game engines.
//!
//! Captures the microphone through a platform backend, optionally mixes it
//! with the engine's rendered audio, and streams the result into 16-bit PCM
//! WAV files. Platform backends implement the `MicrophoneBackend` trait and
//! engine audio enters through `EngineAudioTap`.
//!
//! ## Architecture
//!
//! ```text
//! mic-capture-core (this crate)
//! ├── traits/       ← MicrophoneBackend, EngineAudioTap, Recorder
//! ├── models/       ← NatMicError, AudioFormat, SampleEvent, MixerConfig, etc.
//! ├── processing/   ← RingBuffer, AudioMixer, sample math, WAV header generation
//! ├── session/      ← RecordingController, RecorderSink, DispatchQueue
//! ├── storage/      ← WavRecorder, metadata
//! └── platforms/    ← backend factory, GeneratorBackend, NullBackend
//! ```

pub mod models;
pub mod platforms;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioLevels, MixerStats};
pub use models::config::{GeneratorConfig, MixerConfig};
pub use models::error::NatMicError;
pub use models::event::{SampleBufferCallback, SampleEvent};
pub use models::format::AudioFormat;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::MixerState;
pub use platforms::{create_backend, BackendOptions, GeneratorBackend, GeneratorTap, NullBackend, Platform};
pub use processing::mixer::AudioMixer;
pub use processing::ring_buffer::RingBuffer;
pub use session::controller::RecordingController;
pub use session::dispatch::DispatchQueue;
pub use session::pipeline::RecorderSink;
pub use storage::wav_recorder::WavRecorder;
pub use traits::engine_tap::EngineAudioTap;
pub use traits::microphone_backend::MicrophoneBackend;
pub use traits::recorder::{Recorder, RecordingCallback};
