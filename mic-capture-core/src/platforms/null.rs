use std::path::PathBuf;

use crate::models::error::NatMicError;
use crate::models::event::SampleBufferCallback;
use crate::models::format::AudioFormat;
use crate::traits::microphone_backend::MicrophoneBackend;

/// Backend for platforms without microphone support. Every start is refused.
#[derive(Debug, Clone)]
pub struct NullBackend {
    platform: String,
    recording_path: PathBuf,
}

impl NullBackend {
    pub fn new(platform: impl Into<String>, recording_path: impl Into<PathBuf>) -> Self {
        Self {
            platform: platform.into(),
            recording_path: recording_path.into(),
        }
    }
}

impl MicrophoneBackend for NullBackend {
    fn is_recording(&self) -> bool {
        false
    }

    fn recording_path(&self) -> PathBuf {
        self.recording_path.clone()
    }

    fn start_recording(&mut self, _format: AudioFormat, _callback: SampleBufferCallback) -> Result<(), NatMicError> {
        log::error!("Microphone recording is not supported on {}", self.platform);
        Err(NatMicError::Unsupported(self.platform.clone()))
    }

    fn stop_recording(&mut self) -> Result<(), NatMicError> {
        Err(NatMicError::NotRecording)
    }
}
