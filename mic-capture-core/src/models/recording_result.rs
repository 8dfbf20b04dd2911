use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::AudioFormat;

/// Result returned when a recorder is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub format: AudioFormat,
    pub total_samples: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub created_at: String,
    pub format: AudioFormat,
    pub total_samples: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn from_result(result: &RecordingResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: result.file_path.to_string_lossy().into_owned(),
            created_at: chrono::Utc::now().to_rfc3339(),
            format: result.format,
            total_samples: result.total_samples,
            duration_secs: result.duration_secs,
            checksum: result.checksum.clone(),
        }
    }
}
