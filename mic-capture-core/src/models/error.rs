use thiserror::Error;

/// Errors reported by the capture pipeline.
///
/// Every refusal is logged where it happens and returned to the caller.
/// None of them is fatal: a failed start or stop has to be reissued explicitly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NatMicError {
    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("sample buffer callback is missing")]
    NullCallback,

    #[error("engine audio source is missing or destroyed")]
    NullSource,

    #[error("recorder must be started before committing samples")]
    UncommittedState,

    #[error("sample buffer is null or empty")]
    NullOrEmptyBuffer,

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("insufficient samples: requested {requested}, available {available}")]
    InsufficientSamples { requested: usize, available: u64 },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid wav: {0}")]
    InvalidWav(String),

    #[error("failed to spawn thread: {0}")]
    Spawn(String),
}
