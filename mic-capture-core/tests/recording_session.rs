use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use mic_capture_core::processing::wav_format;
use mic_capture_core::storage::metadata;
use mic_capture_core::{
    create_backend, AudioFormat, BackendOptions, DispatchQueue, EngineAudioTap, GeneratorBackend, GeneratorConfig,
    GeneratorTap, MixerConfig, NatMicError, Platform, RecorderSink, RecordingController, RecordingMetadata,
};

struct Harness {
    dir: tempfile::TempDir,
    queue: DispatchQueue,
    sink: RecorderSink,
    completed: Arc<Mutex<Vec<PathBuf>>>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let queue = DispatchQueue::new();
    let completed = Arc::new(Mutex::new(Vec::new()));
    let paths = Arc::clone(&completed);
    let sink = RecorderSink::new(dir.path(), queue.clone(), move |path| paths.lock().push(path));
    Harness {
        dir,
        queue,
        sink,
        completed,
    }
}

fn wav_files(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "wav"))
        .collect()
}

/// Drain the queue until a completion arrives, as a host main loop would.
fn wait_for_completion(harness: &Harness) -> PathBuf {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        harness.queue.drain();
        if let Some(path) = harness.completed.lock().first() {
            return path.clone();
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("recording did not complete");
}

#[test]
fn microphone_recording_end_to_end() {
    let h = harness();
    let config = GeneratorConfig {
        buffer_frames: 256,
        realtime: false,
        max_buffers: Some(3),
        ..GeneratorConfig::silence()
    };
    let backend = GeneratorBackend::new(config, h.dir.path());
    let mut controller = RecordingController::new(Box::new(backend));
    let format = AudioFormat::new(48000, 2);

    controller.start_recording(format, Some(h.sink.callback())).unwrap();
    assert!(controller.is_recording());
    thread::sleep(Duration::from_millis(100));
    controller.stop_recording().unwrap();
    assert!(!controller.is_recording());

    // Completion waits for the main loop.
    assert!(h.completed.lock().is_empty());
    assert_eq!(h.queue.drain(), 1);
    let path = h.completed.lock()[0].clone();

    let bytes = fs::read(&path).unwrap();
    let header = wav_format::parse_wav_header(&bytes).unwrap();
    assert_eq!(header.format, format);
    assert_eq!(header.data_size, 3 * 512 * 2);
    assert_eq!(bytes.len(), 44 + 3 * 512 * 2);
    assert!((header.duration_secs() - 0.016).abs() < 1e-9);

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 3 * 512);
    assert!(samples.iter().all(|&s| s == 0));

    let result = h.sink.last_result().unwrap();
    assert_eq!(result.file_path, path);
    assert_eq!(result.total_samples, 3 * 512);
}

#[test]
fn mono_duration_matches_sample_count() {
    let h = harness();
    let config = GeneratorConfig {
        buffer_frames: 512,
        realtime: false,
        max_buffers: Some(3),
        ..GeneratorConfig::silence()
    };
    let mut controller = RecordingController::new(Box::new(GeneratorBackend::new(config, h.dir.path())));

    controller
        .start_recording(AudioFormat::new(48000, 1), Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(100));
    controller.stop_recording().unwrap();

    let result = h.sink.last_result().unwrap();
    assert_eq!(result.total_samples, 3 * 512);
    assert!((result.duration_secs - 3.0 * 512.0 / 48000.0).abs() < 1e-9);
}

#[test]
fn tone_survives_pcm_conversion() {
    let h = harness();
    let config = GeneratorConfig {
        frequency_hz: 1000.0,
        amplitude: 0.5,
        buffer_frames: 480,
        realtime: false,
        max_buffers: Some(10),
    };
    let mut controller = RecordingController::new(Box::new(GeneratorBackend::new(config, h.dir.path())));

    controller
        .start_recording(AudioFormat::new(48000, 1), Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(100));
    controller.stop_recording().unwrap();

    let path = h.sink.last_result().unwrap().file_path;
    let samples: Vec<i16> = hound::WavReader::open(&path)
        .unwrap()
        .samples::<i16>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(samples.len(), 4800);
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
    // 1 kHz at 48 kHz lands exactly on the crest every 48 samples.
    assert!((16380..=16384).contains(&peak), "peak {}", peak);
}

#[test]
fn overlay_recording_mixes_engine_audio() {
    let h = harness();
    let format = AudioFormat::new(48000, 2);
    let mic = GeneratorBackend::new(
        GeneratorConfig {
            amplitude: 0.2,
            ..Default::default()
        },
        h.dir.path(),
    );
    let tap: Arc<dyn EngineAudioTap> = Arc::new(GeneratorTap::new(
        format,
        GeneratorConfig {
            frequency_hz: 220.0,
            amplitude: 0.2,
            ..Default::default()
        },
    ));
    let mut controller = RecordingController::new(Box::new(mic)).with_mixer_config(MixerConfig {
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    });

    controller
        .start_recording_with_overlay(Arc::downgrade(&tap), format, Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(250));
    let stats = controller.mixer_stats().unwrap();
    assert!(stats.mix_cycles > 0);
    assert!(stats.levels.engine_level > 0.0);
    controller.stop_recording().unwrap();

    let path = wait_for_completion(&h);
    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);

    let result = h.sink.last_result().unwrap();
    assert!(result.total_samples > 0);
    assert_eq!(result.total_samples % (512 * 2), 0);
    assert_eq!(reader.len() as u64, result.total_samples);
}

#[test]
fn overlay_restart_on_same_sink_keeps_second_recording() {
    let h = harness();
    let format = AudioFormat::new(48000, 2);
    let tap: Arc<dyn EngineAudioTap> = Arc::new(GeneratorTap::new(format, GeneratorConfig::silence()));
    let mic = GeneratorBackend::new(GeneratorConfig::silence(), h.dir.path());
    // A poll interval well above the stop latency leaves the first mixer
    // asleep when the second session starts.
    let mut controller = RecordingController::new(Box::new(mic)).with_mixer_config(MixerConfig {
        poll_interval: Duration::from_millis(130),
        ..Default::default()
    });

    controller
        .start_recording_with_overlay(Arc::downgrade(&tap), format, Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(200));
    controller.stop_recording().unwrap();

    controller
        .start_recording_with_overlay(Arc::downgrade(&tap), format, Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(300));
    assert!(h.sink.is_recording());
    controller.stop_recording().unwrap();
    drop(controller);

    h.queue.drain();
    let completed = h.completed.lock().clone();
    assert_eq!(completed.len(), 2);
    assert_ne!(completed[0], completed[1]);

    let second = h.sink.last_result().unwrap();
    assert_eq!(second.file_path, completed[1]);
    assert!(second.total_samples > 0);
}

#[test]
fn second_start_is_refused_without_side_effects() {
    let h = harness();
    let config = GeneratorConfig {
        realtime: false,
        max_buffers: Some(1),
        ..GeneratorConfig::silence()
    };
    let mut controller = RecordingController::new(Box::new(GeneratorBackend::new(config, h.dir.path())));
    let format = AudioFormat::new(44100, 1);

    controller.start_recording(format, Some(h.sink.callback())).unwrap();
    assert_eq!(
        controller.start_recording(format, Some(h.sink.callback())),
        Err(NatMicError::AlreadyRecording)
    );
    thread::sleep(Duration::from_millis(20));
    controller.stop_recording().unwrap();

    assert_eq!(wav_files(h.dir.path()).len(), 1);
    assert_eq!(controller.stop_recording(), Err(NatMicError::NotRecording));
}

#[test]
fn missing_callback_is_refused() {
    let h = harness();
    let mut controller = RecordingController::new(Box::new(GeneratorBackend::new(
        GeneratorConfig::silence(),
        h.dir.path(),
    )));

    assert_eq!(
        controller.start_recording(AudioFormat::new(48000, 1), None),
        Err(NatMicError::NullCallback)
    );
    assert!(!controller.is_recording());
    assert!(wav_files(h.dir.path()).is_empty());
}

#[test]
fn unsupported_platform_records_nothing() {
    let h = harness();
    let options = BackendOptions {
        recording_path: h.dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut controller = RecordingController::new(create_backend(Platform::Unsupported, options));

    let result = controller.start_recording(AudioFormat::new(48000, 1), Some(h.sink.callback()));
    assert!(matches!(result, Err(NatMicError::Unsupported(_))));
    assert!(!controller.is_recording());
    assert_eq!(controller.recording_path(), h.dir.path());
    assert!(wav_files(h.dir.path()).is_empty());
}

#[test]
fn metadata_sidecar_describes_recording() {
    let h = harness();
    let config = GeneratorConfig {
        buffer_frames: 160,
        realtime: false,
        max_buffers: Some(5),
        ..GeneratorConfig::silence()
    };
    let mut controller = RecordingController::new(Box::new(GeneratorBackend::new(config, h.dir.path())));

    controller
        .start_recording(AudioFormat::new(16000, 1), Some(h.sink.callback()))
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    controller.stop_recording().unwrap();

    let result = h.sink.last_result().unwrap();
    let written = RecordingMetadata::from_result(&result);
    metadata::write_metadata(&written, &result.file_path).unwrap();

    let loaded = metadata::read_metadata(&result.file_path).unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.total_samples, 800);
    assert!((loaded.duration_secs - 0.05).abs() < 1e-9);
    assert_eq!(loaded.checksum, result.checksum);
}
