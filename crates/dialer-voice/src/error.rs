use thiserror::Error;

/// Errors produced by the voice adapters.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("speech recognition error: {0}")]
    Recognition(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("capability not available: {0}")]
    Unsupported(&'static str),
}

/// Recognition provider errors, forwarded verbatim to observers.
///
/// None of these are fatal to a session; callers degrade to text mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// The provider heard nothing before its internal timeout.
    #[error("no-speech")]
    NoSpeech,

    /// Microphone permission was denied.
    #[error("permission-denied")]
    PermissionDenied,

    /// The provider's network-backed recognition service failed.
    #[error("network")]
    Network,

    /// Any other provider-reported condition.
    #[error("{0}")]
    Other(String),
}
