pub mod mixer;
pub mod mixing;
pub mod ring_buffer;
pub mod wav_format;
