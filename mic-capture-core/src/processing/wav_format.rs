//! WAV file format utilities.
//!
//! Generates and parses the canonical 44-byte RIFF header for 16-bit PCM.

use crate::models::error::NatMicError;
use crate::models::format::{AudioFormat, BITS_PER_SAMPLE};

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Generate a 44-byte WAV RIFF header for 16-bit PCM.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * 2
/// [32-33]  block_align = channels * 2
/// [34-35]  16
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(format: AudioFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channel_count.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Fields read back from a 44-byte PCM header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_chunk_size: u32,
    pub format: AudioFormat,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Number of 16-bit samples in the data chunk.
    pub fn total_samples(&self) -> u64 {
        self.data_size as u64 / 2
    }

    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.total_samples())
    }
}

/// Parse the canonical 44-byte header produced by [`generate_wav_header`].
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, NatMicError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(NatMicError::InvalidWav(format!(
            "header needs {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }
    for (range, tag) in [(0..4, b"RIFF"), (8..12, b"WAVE"), (12..16, b"fmt "), (36..40, b"data")] {
        if &bytes[range.clone()] != tag {
            return Err(NatMicError::InvalidWav(format!(
                "expected {:?} at offset {}",
                String::from_utf8_lossy(tag),
                range.start
            )));
        }
    }
    let format_code = read_u16(bytes, 20);
    if format_code != 1 {
        return Err(NatMicError::InvalidWav(format!("not PCM: format code {}", format_code)));
    }

    Ok(WavHeader {
        riff_chunk_size: read_u32(bytes, 4),
        format: AudioFormat::new(read_u32(bytes, 24), read_u16(bytes, 22)),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        bits_per_sample: read_u16(bytes, 34),
        data_size: read_u32(bytes, 40),
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
