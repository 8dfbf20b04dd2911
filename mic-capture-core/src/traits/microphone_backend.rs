use std::path::PathBuf;

use crate::models::error::NatMicError;
use crate::models::event::SampleBufferCallback;
use crate::models::format::AudioFormat;

/// Interface for platform microphone backends.
///
/// Implemented by:
/// - `NullBackend` (platforms without a linked driver)
/// - `GeneratorBackend` (software signal source)
///
/// A backend is resolved once with [`create_backend`](crate::platforms::create_backend)
/// and handed to the [`RecordingController`](crate::session::controller::RecordingController).
pub trait MicrophoneBackend: Send {
    /// Whether the microphone is currently running.
    fn is_recording(&self) -> bool;

    /// Writable directory where recordings for this platform are stored.
    fn recording_path(&self) -> PathBuf;

    /// Start the microphone, delivering events via `callback`.
    ///
    /// The callback fires on the backend's delivery thread; keep work minimal.
    fn start_recording(&mut self, format: AudioFormat, callback: SampleBufferCallback) -> Result<(), NatMicError>;

    /// Stop the microphone. The backend emits `Finalize` before going idle.
    fn stop_recording(&mut self) -> Result<(), NatMicError>;
}
