use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::event::{SampleBufferCallback, SampleEvent};
use crate::models::format::AudioFormat;
use crate::models::recording_result::RecordingResult;
use crate::session::dispatch::DispatchQueue;
use crate::storage::wav_recorder::WavRecorder;

type CompletionHandler = Arc<dyn Fn(PathBuf) + Send + Sync + 'static>;

struct SinkState {
    recorder: Option<WavRecorder>,
    last_result: Option<RecordingResult>,
}

/// Routes a sample stream into WAV files.
///
/// `Initialize` opens a [`WavRecorder`] at the stream format, `Data` commits
/// samples and `Finalize` writes the header and closes the file. Every
/// finished recording is reported to the completion handler through the
/// dispatch queue.
///
/// Cloning yields another handle to the same sink.
#[derive(Clone)]
pub struct RecorderSink {
    directory: PathBuf,
    dispatcher: DispatchQueue,
    on_complete: CompletionHandler,
    state: Arc<Mutex<SinkState>>,
}

impl RecorderSink {
    pub fn new<F>(directory: impl Into<PathBuf>, dispatcher: DispatchQueue, on_complete: F) -> Self
    where
        F: Fn(PathBuf) + Send + Sync + 'static,
    {
        Self {
            directory: directory.into(),
            dispatcher,
            on_complete: Arc::new(on_complete),
            state: Arc::new(Mutex::new(SinkState {
                recorder: None,
                last_result: None,
            })),
        }
    }

    /// Callback feeding this sink, for handing to the controller.
    pub fn callback(&self) -> SampleBufferCallback {
        let sink = self.clone();
        Arc::new(move |event, format| sink.handle_event(event, format))
    }

    pub fn is_recording(&self) -> bool {
        self.state
            .lock()
            .recorder
            .as_ref()
            .is_some_and(WavRecorder::is_recording)
    }

    /// Result of the most recently finalized recording.
    pub fn last_result(&self) -> Option<RecordingResult> {
        self.state.lock().last_result.clone()
    }

    pub fn handle_event(&self, event: SampleEvent<'_>, format: AudioFormat) {
        let mut state = self.state.lock();
        match event {
            SampleEvent::Initialize => {
                if let Some(mut previous) = state.recorder.take() {
                    log::warn!("Stream reinitialized before finalize; closing previous recording");
                    if let Ok(Some(result)) = previous.dispose() {
                        state.last_result = Some(result);
                    }
                }
                let mut recorder = WavRecorder::new(format, self.directory.clone(), self.dispatcher.clone());
                let handler = Arc::clone(&self.on_complete);
                if recorder.start_recording(Box::new(move |path| handler(path))).is_ok() {
                    state.recorder = Some(recorder);
                }
            }
            SampleEvent::Data {
                samples,
                timestamp_nanos,
            } => match state.recorder.as_mut() {
                Some(recorder) => {
                    // Refusals are logged by the recorder.
                    let _ = recorder.commit_samples(samples, timestamp_nanos);
                }
                None => log::warn!("Dropping {} samples received before initialize", samples.len()),
            },
            SampleEvent::Finalize => {
                let Some(mut recorder) = state.recorder.take() else {
                    log::warn!("Finalize received with no open recording");
                    return;
                };
                match recorder.dispose() {
                    Ok(Some(result)) => state.last_result = Some(result),
                    Ok(None) => {}
                    Err(e) => log::error!("Failed to finalize recording: {}", e),
                }
            }
        }
    }
}
