//! Microphone backend selection.
//!
//! Native capture (iOS, Android, Windows, macOS) lives in the host bindings.
//! This crate ships the software [`GeneratorBackend`] and a [`NullBackend`]
//! for everything else.

pub mod generator;
pub mod null;

use std::fmt;
use std::path::PathBuf;

pub use generator::{GeneratorBackend, GeneratorTap};
pub use null::NullBackend;

use crate::models::config::GeneratorConfig;
use crate::traits::microphone_backend::MicrophoneBackend;

/// Platforms a recording session can be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
    Windows,
    MacOs,
    WebGl,
    /// Software signal source.
    Generator,
    Unsupported,
}

impl Platform {
    /// Platform of the running build.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_arch = "wasm32") {
            Platform::WebGl
        } else {
            Platform::Unsupported
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::WebGl => "WebGL",
            Platform::Generator => "Generator",
            Platform::Unsupported => "Unsupported",
        };
        f.write_str(name)
    }
}

/// Options shared by every backend.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Directory recordings are written to.
    pub recording_path: PathBuf,
    pub generator: GeneratorConfig,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            recording_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            generator: GeneratorConfig::default(),
        }
    }
}

/// Create the microphone backend for `platform`.
pub fn create_backend(platform: Platform, options: BackendOptions) -> Box<dyn MicrophoneBackend> {
    match platform {
        Platform::Generator => Box::new(GeneratorBackend::new(options.generator, options.recording_path)),
        other => {
            log::warn!("No native microphone backend for {} in this build; using null backend", other);
            Box::new(NullBackend::new(other.to_string(), options.recording_path))
        }
    }
}
