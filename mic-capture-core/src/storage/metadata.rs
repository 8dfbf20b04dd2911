use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::NatMicError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `{recording}.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, NatMicError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| NatMicError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| NatMicError::Storage(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, NatMicError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| NatMicError::Storage(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| NatMicError::Storage(format!("failed to parse metadata: {}", e)))
}
