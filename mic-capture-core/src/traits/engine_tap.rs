use crate::models::event::SampleBufferCallback;

/// An engine-audio endpoint (an audio source or listener) whose rendered
/// output can be tapped for overlay mixing.
///
/// The tap delivers `Data` events from the engine's audio thread at the
/// engine's output format.
pub trait EngineAudioTap: Send + Sync {
    /// Start forwarding rendered buffers to `callback`, replacing any previous one.
    fn install(&self, callback: SampleBufferCallback);

    /// Stop forwarding buffers.
    fn remove(&self);
}
