use crate::models::error::NatMicError;
use crate::models::format::AudioFormat;
use crate::models::recording_result::RecordingResult;

/// Callback receiving the path of a finished recording.
pub type RecordingCallback = Box<dyn FnOnce(std::path::PathBuf) + Send + 'static>;

/// A sink that turns committed sample buffers into a recording.
pub trait Recorder: Send {
    /// Format of the audio data being recorded.
    fn format(&self) -> AudioFormat;

    /// Start recording. `on_complete` is dispatched to the main context once
    /// the recording is finalized.
    fn start_recording(&mut self, on_complete: RecordingCallback) -> Result<(), NatMicError>;

    /// Commit interleaved samples with their timestamp in nanoseconds.
    fn commit_samples(&mut self, samples: &[f32], timestamp_nanos: i64) -> Result<(), NatMicError>;

    /// Finalize the recording. Returns `None` when already finalized.
    fn dispose(&mut self) -> Result<Option<RecordingResult>, NatMicError>;
}
