//! Backend traits seaming the host's speech and audio capabilities.
//!
//! The adapters in this crate own the coordination contracts (restart,
//! cancellation, bucketing); a backend only has to surface the raw host
//! capability. The `Null*` implementations report the capability as
//! unsupported, which is what a host without speech APIs plugs in.

use crate::error::{RecognitionError, VoiceError};
use dialer_types::SynthesisParams;
use tokio::sync::{mpsc, oneshot, watch};

/// One text span from a recognition result event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSpan {
    pub text: String,
    /// Finalized spans no longer change; interim spans may.
    pub is_final: bool,
}

impl SpeechSpan {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Events flowing out of an active recognition capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A batch of recognized spans, interim and finalized mixed.
    Results(Vec<SpeechSpan>),
    /// A provider-reported error. Never terminates the capture by
    /// itself.
    Error(RecognitionError),
    /// The provider terminated the capture stream.
    Ended,
}

/// A continuous speech-recognition capability.
pub trait RecognitionBackend: Send + Sync {
    /// Whether the host supports speech recognition at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Begins a capture session. Events arrive on the returned channel
    /// until the provider ends the stream (an `Ended` event or channel
    /// closure, which the recognizer treats identically).
    fn start_capture(&self) -> Result<mpsc::Receiver<CaptureEvent>, VoiceError>;

    /// Asks the provider to end the current capture session. Harmless
    /// when no capture is active.
    fn stop_capture(&self);
}

/// One voice available for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    pub is_default: bool,
}

/// Terminal outcome of a single utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Playback ran to completion.
    Completed,
    /// The utterance was cancelled, normally because a newer one
    /// superseded it.
    Cancelled,
    /// The host failed to synthesize or play the utterance.
    Failed(String),
}

/// A text-to-speech capability.
///
/// The backend plays at most one utterance at a time; the synthesizer
/// enforces last-call-wins by cancelling before every new `speak`.
pub trait SynthesisBackend: Send + Sync {
    /// Whether the host supports speech synthesis at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// The host's voice list. Some hosts populate it asynchronously;
    /// the watch channel carries every revision.
    fn voices(&self) -> watch::Receiver<Vec<Voice>>;

    /// Starts playback of an utterance. The returned channel resolves
    /// with the utterance's terminal outcome; dropping the sender is
    /// equivalent to `Cancelled`.
    fn speak(
        &self,
        text: &str,
        params: &SynthesisParams,
        voice: Option<&Voice>,
    ) -> Result<oneshot::Receiver<UtteranceOutcome>, VoiceError>;

    /// Pauses the in-progress utterance, if any.
    fn pause(&self);

    /// Resumes a paused utterance, if any.
    fn resume(&self);

    /// Cancels the in-progress utterance, if any, resolving its outcome
    /// channel with `Cancelled`.
    fn cancel(&self);
}

/// An audio-analysis graph fed by the microphone.
///
/// All acquisition methods report failure as a boolean so callers can
/// degrade without exception paths.
pub trait CaptureGraphBackend: Send {
    /// Whether the host has an audio-processing graph at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Acquires the processing graph.
    fn init_graph(&mut self) -> bool;

    /// Requests microphone access and connects it to the graph.
    fn open_microphone(&mut self) -> bool;

    /// Current frequency-domain snapshot, one byte magnitude per bin.
    fn frequency_snapshot(&self) -> Vec<u8>;

    /// Disconnects the microphone and stops its tracks.
    fn close_microphone(&mut self);

    /// Releases the processing graph.
    fn close_graph(&mut self);
}

// ── Null backends ────────────────────────────────────────────────────

/// Recognition backend for hosts without the capability.
#[derive(Debug, Default)]
pub struct NullRecognition;

impl RecognitionBackend for NullRecognition {
    fn is_supported(&self) -> bool {
        false
    }

    fn start_capture(&self) -> Result<mpsc::Receiver<CaptureEvent>, VoiceError> {
        Err(VoiceError::Unsupported("speech recognition"))
    }

    fn stop_capture(&self) {}
}

/// Synthesis backend for hosts without the capability.
#[derive(Debug)]
pub struct NullSynthesis {
    voices_tx: watch::Sender<Vec<Voice>>,
}

impl Default for NullSynthesis {
    fn default() -> Self {
        let (voices_tx, _) = watch::channel(Vec::new());
        Self { voices_tx }
    }
}

impl SynthesisBackend for NullSynthesis {
    fn is_supported(&self) -> bool {
        false
    }

    fn voices(&self) -> watch::Receiver<Vec<Voice>> {
        self.voices_tx.subscribe()
    }

    fn speak(
        &self,
        _text: &str,
        _params: &SynthesisParams,
        _voice: Option<&Voice>,
    ) -> Result<oneshot::Receiver<UtteranceOutcome>, VoiceError> {
        Err(VoiceError::Unsupported("speech synthesis"))
    }

    fn pause(&self) {}
    fn resume(&self) {}
    fn cancel(&self) {}
}

/// Capture backend for hosts without an audio graph or microphone.
#[derive(Debug, Default)]
pub struct NullCaptureGraph;

impl CaptureGraphBackend for NullCaptureGraph {
    fn is_supported(&self) -> bool {
        false
    }

    fn init_graph(&mut self) -> bool {
        false
    }

    fn open_microphone(&mut self) -> bool {
        false
    }

    fn frequency_snapshot(&self) -> Vec<u8> {
        Vec::new()
    }

    fn close_microphone(&mut self) {}
    fn close_graph(&mut self) {}
}
