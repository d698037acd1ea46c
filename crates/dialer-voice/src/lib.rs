//! Voice I/O coordination for the Dialer core.
//!
//! Three adapters over host speech/audio capabilities:
//!
//! - [`SpeechRecognizer`] — continuous speech-to-text capture that
//!   partitions provider results into finalized and interim text and
//!   auto-restarts when the provider terminates unexpectedly.
//! - [`SpeechSynthesizer`] — text-to-speech with at most one utterance
//!   in flight (last-call-wins), personality presets, and logical voice
//!   selection with a default fallback.
//! - [`AudioLevelSampler`] — normalized frequency buckets for waveform
//!   rendering, plus a bounded idle animation when capture is inactive.
//!
//! The host capabilities themselves sit behind the backend traits in
//! [`backend`]; hosts without a capability plug in the `Null*` backend
//! and the caller degrades to text-only mode. None of the adapters
//! treat a platform failure as fatal.

pub mod backend;
mod error;
mod recognizer;
mod sampler;
mod synthesizer;

pub use backend::{
    CaptureEvent, CaptureGraphBackend, NullCaptureGraph, NullRecognition, NullSynthesis,
    RecognitionBackend, SpeechSpan, SynthesisBackend, UtteranceOutcome, Voice,
};
pub use error::{RecognitionError, VoiceError};
pub use recognizer::{RecognizerEvent, SpeechRecognizer, TranscriptChunk};
pub use sampler::AudioLevelSampler;
pub use synthesizer::SpeechSynthesizer;
