pub mod engine_tap;
pub mod microphone_backend;
pub mod recorder;
