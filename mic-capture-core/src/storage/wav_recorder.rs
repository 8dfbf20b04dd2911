use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::NatMicError;
use crate::models::format::AudioFormat;
use crate::models::recording_result::RecordingResult;
use crate::processing::{mixing, wav_format};
use crate::session::dispatch::DispatchQueue;
use crate::traits::recorder::{RecordingCallback, Recorder};

/// Streaming 16-bit PCM WAV recorder.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, zero-filled until dispose]
/// [raw 16-bit little-endian PCM data...]
/// ```
///
/// The header is only valid after [`dispose`](Self::dispose); a file observed
/// mid-recording still carries the zeroed placeholder.
pub struct WavRecorder {
    format: AudioFormat,
    output_directory: PathBuf,
    dispatcher: DispatchQueue,
    file: Option<File>,
    file_path: Option<PathBuf>,
    callback: Option<RecordingCallback>,
    total_samples: u64,
    pcm: Vec<u8>,
}

impl WavRecorder {
    /// Create a recorder for `format` writing into `output_directory`.
    /// The completion callback is dispatched onto `dispatcher`.
    pub fn new(format: AudioFormat, output_directory: impl Into<PathBuf>, dispatcher: DispatchQueue) -> Self {
        Self {
            format,
            output_directory: output_directory.into(),
            dispatcher,
            file: None,
            file_path: None,
            callback: None,
            total_samples: 0,
            pcm: Vec::new(),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_recording(&self) -> bool {
        self.file.is_some()
    }

    /// Samples committed since the last start.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Path of the current or last recording.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Open a new timestamped file and reserve the 44-byte header.
    pub fn start_recording(&mut self, on_complete: RecordingCallback) -> Result<(), NatMicError> {
        if self.file.is_some() {
            log::error!("WavRecorder::start_recording called while already recording");
            return Err(NatMicError::AlreadyRecording);
        }
        if let Err(e) = self.format.validate() {
            log::error!("Cannot start WAV recording: {}", e);
            return Err(e);
        }

        fs::create_dir_all(&self.output_directory)
            .map_err(|e| storage_error("failed to create directory", e))?;
        let (mut file, file_path) = create_recording_file(&self.output_directory)?;

        file.write_all(&[0u8; wav_format::WAV_HEADER_SIZE])
            .map_err(|e| storage_error("failed to reserve header", e))?;

        log::info!("Recording {} to {}", self.format, file_path.display());
        self.file = Some(file);
        self.file_path = Some(file_path);
        self.callback = Some(on_complete);
        self.total_samples = 0;
        Ok(())
    }

    /// Convert `samples` to 16-bit PCM and append them to the file.
    pub fn commit_samples(&mut self, samples: &[f32], _timestamp_nanos: i64) -> Result<(), NatMicError> {
        let Some(file) = self.file.as_mut() else {
            log::error!("WavRecorder::start_recording must be called before committing samples");
            return Err(NatMicError::UncommittedState);
        };
        if samples.is_empty() {
            log::error!("WavRecorder::commit_samples called with an empty sample buffer");
            return Err(NatMicError::NullOrEmptyBuffer);
        }

        self.pcm.clear();
        mixing::convert_to_int16_pcm(samples, &mut self.pcm);
        file.write_all(&self.pcm)
            .map_err(|e| storage_error("write failed", e))?;
        self.total_samples += samples.len() as u64;
        Ok(())
    }

    /// Rewrite the header with the final sizes, close the file, and dispatch
    /// the completion callback with the file path.
    ///
    /// Calling it again after the recording is finalized returns `Ok(None)`.
    pub fn dispose(&mut self) -> Result<Option<RecordingResult>, NatMicError> {
        let Some(mut file) = self.file.take() else {
            log::warn!("WavRecorder::dispose called with no active recording");
            return Ok(None);
        };
        let file_path = self.file_path.clone().unwrap_or_default();

        let data_size = (self.total_samples * 2).min(u32::MAX as u64 - 36) as u32;
        let header = wav_format::generate_wav_header(self.format, data_size);
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(&header))
            .and_then(|_| file.flush())
            .map_err(|e| storage_error("failed to finalize header", e))?;
        drop(file);

        // The file is complete once the header is in place.
        if let Some(callback) = self.callback.take() {
            let path = file_path.clone();
            self.dispatcher.dispatch(move || callback(path));
        }

        let checksum = sha256_file(&file_path)?;
        let result = RecordingResult {
            file_path: file_path.clone(),
            format: self.format,
            total_samples: self.total_samples,
            duration_secs: self.format.duration_secs(self.total_samples),
            checksum,
        };
        log::info!(
            "Finalized {} ({} samples, {:.3}s)",
            file_path.display(),
            result.total_samples,
            result.duration_secs
        );
        Ok(Some(result))
    }
}

impl Recorder for WavRecorder {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn start_recording(&mut self, on_complete: RecordingCallback) -> Result<(), NatMicError> {
        WavRecorder::start_recording(self, on_complete)
    }

    fn commit_samples(&mut self, samples: &[f32], timestamp_nanos: i64) -> Result<(), NatMicError> {
        WavRecorder::commit_samples(self, samples, timestamp_nanos)
    }

    fn dispose(&mut self) -> Result<Option<RecordingResult>, NatMicError> {
        WavRecorder::dispose(self)
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(e) = self.dispose() {
                log::error!("Failed to finalize recording on drop: {}", e);
            }
        }
    }
}

/// File name for a recording started now, `recording_<yyyy_MM_dd_HH_mm_ss_fff>.wav`.
pub fn recording_file_name() -> String {
    format!("recording_{}.wav", chrono::Local::now().format("%Y_%m_%d_%H_%M_%S_%3f"))
}

/// Create a fresh recording file, adding a counter suffix when two recordings
/// start within the same millisecond.
fn create_recording_file(directory: &Path) -> Result<(File, PathBuf), NatMicError> {
    let base = recording_file_name();
    let stem = base.trim_end_matches(".wav");
    for attempt in 0..100 {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{}_{}.wav", stem, attempt)
        };
        let path = directory.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(storage_error("failed to create file", e)),
        }
    }
    Err(NatMicError::Storage(format!("no free file name for {}", base)))
}

/// Compute SHA-256 hex digest of a file, streaming it through the hasher.
fn sha256_file(path: &Path) -> Result<String, NatMicError> {
    let mut file = File::open(path).map_err(|e| storage_error("failed to open file for checksum", e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| storage_error("failed to read file for checksum", e))?;
    Ok(hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect())
}

fn storage_error(context: &str, e: io::Error) -> NatMicError {
    log::error!("{}: {}", context, e);
    NatMicError::Storage(format!("{}: {}", context, e))
}
