use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::format::AudioFormat;

/// Event raised by a sample source.
///
/// The sample slice in `Data` is borrowed from the producer for the duration of
/// the callback. Copy it if it has to outlive the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent<'a> {
    /// The source has started. Carries no samples.
    Initialize,
    /// A new buffer of interleaved samples.
    Data {
        samples: &'a [f32],
        timestamp_nanos: i64,
    },
    /// The source has stopped. Carries no samples.
    Finalize,
}

impl<'a> SampleEvent<'a> {
    /// The sample buffer, present exactly for `Data`.
    pub fn samples(&self) -> Option<&'a [f32]> {
        match self {
            Self::Data { samples, .. } => Some(samples),
            _ => None,
        }
    }

    pub fn timestamp_nanos(&self) -> i64 {
        match self {
            Self::Data { timestamp_nanos, .. } => *timestamp_nanos,
            _ => 0,
        }
    }
}

/// Callback receiving sample events together with the stream format.
///
/// Invoked on the producer's thread (audio driver, engine audio, or mixer).
/// Marshal through a [`DispatchQueue`](crate::session::dispatch::DispatchQueue)
/// when main-thread affinity is needed.
pub type SampleBufferCallback = Arc<dyn Fn(SampleEvent<'_>, AudioFormat) + Send + Sync + 'static>;

/// Invoke a user callback, catching and logging a panic so that one faulty
/// consumer cannot take down the producer thread.
pub fn invoke_callback(callback: &SampleBufferCallback, event: SampleEvent<'_>, format: AudioFormat) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(event, format))) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".into());
        log::error!("Sample buffer callback raised: {}", message);
    }
}
