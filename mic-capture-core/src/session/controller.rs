use std::path::PathBuf;
use std::sync::{Arc, Weak};

use crate::models::audio_models::MixerStats;
use crate::models::config::MixerConfig;
use crate::models::error::NatMicError;
use crate::models::event::SampleBufferCallback;
use crate::models::format::AudioFormat;
use crate::processing::mixer::AudioMixer;
use crate::traits::engine_tap::EngineAudioTap;
use crate::traits::microphone_backend::MicrophoneBackend;

/// Entry point for recording sessions.
///
/// Owns the platform microphone backend and, for overlay sessions, the mixer
/// and the engine-audio tap feeding it.
///
/// ```text
/// plain:    [backend] ──────────────────────────────→ callback
/// overlay:  [backend] → mic callback ──┐
///                                      ├→ [AudioMixer] → callback
///           [tap] → engine callback ───┘
/// ```
pub struct RecordingController {
    backend: Box<dyn MicrophoneBackend>,
    mixer_config: MixerConfig,
    mixer: Option<AudioMixer>,
    /// Mixer of the last stopped overlay session, still emitting `Finalize`.
    draining: Option<AudioMixer>,
    tap: Option<Arc<dyn EngineAudioTap>>,
}

impl RecordingController {
    pub fn new(backend: Box<dyn MicrophoneBackend>) -> Self {
        Self {
            backend,
            mixer_config: MixerConfig::default(),
            mixer: None,
            draining: None,
            tap: None,
        }
    }

    /// Mixer settings used by subsequent overlay sessions.
    pub fn with_mixer_config(mut self, config: MixerConfig) -> Self {
        self.mixer_config = config;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.backend.is_recording()
    }

    /// Directory the backend stores recordings in.
    pub fn recording_path(&self) -> PathBuf {
        self.backend.recording_path()
    }

    /// Stats of the active overlay mixer, if any.
    pub fn mixer_stats(&self) -> Option<MixerStats> {
        self.mixer.as_ref().map(AudioMixer::stats)
    }

    /// Record the microphone alone, delivering its events to `callback`.
    pub fn start_recording(
        &mut self,
        format: AudioFormat,
        callback: Option<SampleBufferCallback>,
    ) -> Result<(), NatMicError> {
        let callback = self.check_start(format, callback)?;
        self.finish_draining();
        self.backend.start_recording(format, callback).inspect_err(|e| {
            log::error!("Failed to start microphone: {}", e);
        })?;
        log::info!("Recording started at {}", format);
        Ok(())
    }

    /// Record the microphone mixed with the output of `tap`.
    ///
    /// `format` is the mixing format and must match the tap's channel count.
    /// The microphone is requested in mono at the same sample rate.
    pub fn start_recording_with_overlay(
        &mut self,
        tap: Weak<dyn EngineAudioTap>,
        format: AudioFormat,
        callback: Option<SampleBufferCallback>,
    ) -> Result<(), NatMicError> {
        let callback = self.check_start(format, callback)?;
        let Some(tap) = tap.upgrade() else {
            log::error!("Cannot start overlay recording: audio source has been dropped");
            return Err(NatMicError::NullSource);
        };
        self.finish_draining();

        let mut mixer = AudioMixer::new(format, self.mixer_config.clone(), callback).inspect_err(|e| {
            log::error!("Failed to create mixer: {}", e);
        })?;
        tap.install(mixer.engine_callback());

        let mic_format = AudioFormat::for_microphone(format.sample_rate);
        if let Err(e) = self.backend.start_recording(mic_format, mixer.microphone_callback()) {
            log::error!("Failed to start microphone: {}", e);
            tap.remove();
            mixer.join();
            return Err(e);
        }

        log::info!("Overlay recording started at {}", format);
        self.mixer = Some(mixer);
        self.tap = Some(tap);
        Ok(())
    }

    /// Stop the active session.
    ///
    /// For overlay sessions the mixer emits its `Finalize` asynchronously
    /// from its own thread after this returns. The next start waits for it,
    /// so a stale `Finalize` never follows the next session's `Initialize`.
    pub fn stop_recording(&mut self) -> Result<(), NatMicError> {
        if !self.is_recording() {
            log::error!("Cannot stop recording: not recording");
            return Err(NatMicError::NotRecording);
        }

        if let Some(tap) = self.tap.take() {
            tap.remove();
        }
        if let Some(mixer) = self.mixer.take() {
            mixer.dispose();
            self.draining = Some(mixer);
        }
        let result = self.backend.stop_recording();
        match &result {
            Ok(()) => log::info!("Recording stopped"),
            Err(e) => log::error!("Failed to stop microphone: {}", e),
        }
        result
    }

    /// Wait for the previous overlay mixer to emit `Finalize` and exit.
    fn finish_draining(&mut self) {
        if let Some(mut mixer) = self.draining.take() {
            mixer.join();
        }
    }

    fn check_start(
        &self,
        format: AudioFormat,
        callback: Option<SampleBufferCallback>,
    ) -> Result<SampleBufferCallback, NatMicError> {
        if self.is_recording() {
            log::error!("Cannot start recording: already recording");
            return Err(NatMicError::AlreadyRecording);
        }
        let Some(callback) = callback else {
            log::error!("Cannot start recording: sample buffer callback is missing");
            return Err(NatMicError::NullCallback);
        };
        if let Err(e) = format.validate() {
            log::error!("Cannot start recording: {}", e);
            return Err(e);
        }
        Ok(callback)
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        if self.is_recording() {
            let _ = self.stop_recording();
        }
        self.finish_draining();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::SampleEvent;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Backend that records how it was driven without producing audio.
    #[derive(Default)]
    struct MockBackend {
        recording: bool,
        fail_start: bool,
        starts: Arc<AtomicUsize>,
        last_format: Arc<Mutex<Option<AudioFormat>>>,
    }

    impl MicrophoneBackend for MockBackend {
        fn is_recording(&self) -> bool {
            self.recording
        }

        fn recording_path(&self) -> PathBuf {
            PathBuf::from("/mock")
        }

        fn start_recording(&mut self, format: AudioFormat, _callback: SampleBufferCallback) -> Result<(), NatMicError> {
            if self.fail_start {
                return Err(NatMicError::Unsupported("mock".into()));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            *self.last_format.lock() = Some(format);
            self.recording = true;
            Ok(())
        }

        fn stop_recording(&mut self) -> Result<(), NatMicError> {
            self.recording = false;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockTap {
        installed: AtomicBool,
        removals: AtomicUsize,
    }

    impl EngineAudioTap for MockTap {
        fn install(&self, _callback: SampleBufferCallback) {
            self.installed.store(true, Ordering::SeqCst);
        }

        fn remove(&self) {
            self.installed.store(false, Ordering::SeqCst);
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn noop() -> Option<SampleBufferCallback> {
        Some(Arc::new(|_: SampleEvent<'_>, _: AudioFormat| {}))
    }

    #[test]
    fn start_and_stop() {
        let mut controller = RecordingController::new(Box::new(MockBackend::default()));
        assert!(!controller.is_recording());

        controller.start_recording(AudioFormat::new(48000, 1), noop()).unwrap();
        assert!(controller.is_recording());
        assert_eq!(controller.recording_path(), PathBuf::from("/mock"));

        controller.stop_recording().unwrap();
        assert!(!controller.is_recording());
    }

    #[test]
    fn refuses_missing_callback() {
        let mut controller = RecordingController::new(Box::new(MockBackend::default()));
        assert_eq!(
            controller.start_recording(AudioFormat::new(48000, 1), None),
            Err(NatMicError::NullCallback)
        );
        assert!(!controller.is_recording());
    }

    #[test]
    fn refuses_second_start() {
        let backend = MockBackend::default();
        let starts = Arc::clone(&backend.starts);
        let mut controller = RecordingController::new(Box::new(backend));

        controller.start_recording(AudioFormat::new(48000, 1), noop()).unwrap();
        assert_eq!(
            controller.start_recording(AudioFormat::new(48000, 1), noop()),
            Err(NatMicError::AlreadyRecording)
        );
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn refuses_stop_when_idle() {
        let mut controller = RecordingController::new(Box::new(MockBackend::default()));
        assert_eq!(controller.stop_recording(), Err(NatMicError::NotRecording));
    }

    #[test]
    fn refuses_invalid_format() {
        let mut controller = RecordingController::new(Box::new(MockBackend::default()));
        let result = controller.start_recording(AudioFormat::new(0, 1), noop());
        assert!(matches!(result, Err(NatMicError::InvalidFormat(_))));
    }

    #[test]
    fn overlay_refuses_dropped_source() {
        let mut controller = RecordingController::new(Box::new(MockBackend::default()));
        let tap: Arc<dyn EngineAudioTap> = Arc::new(MockTap::default());
        let weak = Arc::downgrade(&tap);
        drop(tap);

        assert_eq!(
            controller.start_recording_with_overlay(weak, AudioFormat::new(48000, 2), noop()),
            Err(NatMicError::NullSource)
        );
        assert!(!controller.is_recording());
    }

    #[test]
    fn overlay_requests_mono_microphone_and_removes_tap_on_stop() {
        let backend = MockBackend::default();
        let last_format = Arc::clone(&backend.last_format);
        let mut controller = RecordingController::new(Box::new(backend));
        let tap = Arc::new(MockTap::default());
        let dyn_tap: Arc<dyn EngineAudioTap> = tap.clone();

        controller
            .start_recording_with_overlay(Arc::downgrade(&dyn_tap), AudioFormat::new(44100, 2), noop())
            .unwrap();
        assert!(tap.installed.load(Ordering::SeqCst));
        assert_eq!(*last_format.lock(), Some(AudioFormat::new(44100, 1)));
        assert!(controller.mixer_stats().is_some());

        controller.stop_recording().unwrap();
        assert!(!tap.installed.load(Ordering::SeqCst));
        assert_eq!(tap.removals.load(Ordering::SeqCst), 1);
        assert!(controller.mixer_stats().is_none());
    }

    #[test]
    fn overlay_cleans_up_when_microphone_fails() {
        let backend = MockBackend {
            fail_start: true,
            ..Default::default()
        };
        let mut controller = RecordingController::new(Box::new(backend));
        let tap = Arc::new(MockTap::default());
        let dyn_tap: Arc<dyn EngineAudioTap> = tap.clone();

        let result = controller.start_recording_with_overlay(Arc::downgrade(&dyn_tap), AudioFormat::new(48000, 2), noop());
        assert!(matches!(result, Err(NatMicError::Unsupported(_))));
        assert!(!tap.installed.load(Ordering::SeqCst));
        assert!(controller.mixer_stats().is_none());
    }

    #[test]
    fn restart_waits_for_previous_mixer_to_finalize() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: SampleBufferCallback = Arc::new(move |event, _| {
            let label = match event {
                SampleEvent::Initialize => "initialize",
                SampleEvent::Data { .. } => "data",
                SampleEvent::Finalize => "finalize",
            };
            sink.lock().push(label);
        });
        let tap: Arc<dyn EngineAudioTap> = Arc::new(MockTap::default());
        let mut controller = RecordingController::new(Box::new(MockBackend::default())).with_mixer_config(
            MixerConfig {
                poll_interval: std::time::Duration::from_millis(100),
                ..Default::default()
            },
        );
        let format = AudioFormat::new(48000, 2);

        controller
            .start_recording_with_overlay(Arc::downgrade(&tap), format, Some(callback.clone()))
            .unwrap();
        controller.stop_recording().unwrap();
        controller
            .start_recording_with_overlay(Arc::downgrade(&tap), format, Some(callback))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));

        assert_eq!(*events.lock(), vec!["initialize", "finalize", "initialize"]);
        controller.stop_recording().unwrap();
    }

    #[test]
    fn drop_stops_active_recording() {
        let tap = Arc::new(MockTap::default());
        let dyn_tap: Arc<dyn EngineAudioTap> = tap.clone();
        {
            let mut controller = RecordingController::new(Box::new(MockBackend::default()));
            controller
                .start_recording_with_overlay(Arc::downgrade(&dyn_tap), AudioFormat::new(48000, 2), noop())
                .unwrap();
        }
        assert_eq!(tap.removals.load(Ordering::SeqCst), 1);
    }
}
