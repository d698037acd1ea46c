//! Continuous speech recognition with automatic restart.

use crate::backend::{CaptureEvent, RecognitionBackend, SpeechSpan};
use crate::error::RecognitionError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity of the recognizer's event broadcast channel.
const EVENT_BROADCAST_CAPACITY: usize = 256;

/// One partitioned recognition result delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptChunk {
    /// All finalized spans of the event, space-joined.
    pub final_text: String,
    /// All interim (still mutable) spans of the event, concatenated.
    pub interim_text: String,
    /// True exactly when `final_text` is non-empty.
    pub is_final: bool,
}

/// Events emitted by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    Transcript(TranscriptChunk),
    /// A provider error, forwarded verbatim. Never ends the session.
    Error(RecognitionError),
}

/// Wraps a continuous recognition capture.
///
/// While listening, provider result batches are partitioned into
/// finalized and interim text and broadcast to subscribers. If the
/// provider terminates the capture while the caller still intends to
/// listen, the capture is restarted without caller intervention; a
/// failed restart is reported as an error event and listening stops.
pub struct SpeechRecognizer<B> {
    backend: Arc<B>,
    events_tx: broadcast::Sender<RecognizerEvent>,
    listening: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<B: RecognitionBackend + 'static> SpeechRecognizer<B> {
    pub fn new(backend: B) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        Self {
            backend: Arc::new(backend),
            events_tx,
            listening: Arc::new(AtomicBool::new(false)),
            pump: Mutex::new(None),
        }
    }

    /// Whether the host supports speech recognition.
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Whether the recognizer currently intends to listen.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Subscribes to transcript and error events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent> {
        self.events_tx.subscribe()
    }

    /// Begins continuous capture.
    ///
    /// Returns `false`, without an error, when the capability is absent
    /// or the capture fails to start; callers degrade to text mode.
    /// Calling `start` while already listening is a no-op returning
    /// `true`.
    pub fn start(&self) -> bool {
        if !self.backend.is_supported() {
            warn!("speech recognition not supported on this host");
            return false;
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            return true;
        }

        let rx = match self.backend.start_capture() {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "failed to start speech recognition");
                self.listening.store(false, Ordering::SeqCst);
                return false;
            }
        };

        let handle = tokio::spawn(pump(
            Arc::clone(&self.backend),
            rx,
            self.events_tx.clone(),
            Arc::clone(&self.listening),
        ));
        let mut slot = self.pump.lock().expect("pump lock poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
        true
    }

    /// Stops listening and suppresses the auto-restart. Idempotent:
    /// a second call does nothing.
    pub fn stop(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }
        self.backend.stop_capture();
        if let Some(handle) = self.pump.lock().expect("pump lock poisoned").take() {
            handle.abort();
        }
    }
}

impl<B> Drop for SpeechRecognizer<B> {
    fn drop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.pump.lock().expect("pump lock poisoned").take() {
            handle.abort();
        }
    }
}

/// Consumes capture events, partitions results, and restarts the
/// capture when the provider ends it while we still intend to listen.
async fn pump<B: RecognitionBackend>(
    backend: Arc<B>,
    mut rx: mpsc::Receiver<CaptureEvent>,
    events_tx: broadcast::Sender<RecognizerEvent>,
    listening: Arc<AtomicBool>,
) {
    loop {
        let event = rx.recv().await.unwrap_or(CaptureEvent::Ended);
        match event {
            CaptureEvent::Results(spans) => {
                let chunk = partition(&spans);
                let _ = events_tx.send(RecognizerEvent::Transcript(chunk));
            }
            CaptureEvent::Error(err) => {
                // Forwarded verbatim; the capture stays up.
                let _ = events_tx.send(RecognizerEvent::Error(err));
            }
            CaptureEvent::Ended => {
                if !listening.load(Ordering::SeqCst) {
                    break;
                }
                match backend.start_capture() {
                    Ok(new_rx) => {
                        debug!("recognition ended unexpectedly, restarting capture");
                        rx = new_rx;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to restart speech recognition");
                        listening.store(false, Ordering::SeqCst);
                        let _ = events_tx
                            .send(RecognizerEvent::Error(RecognitionError::Other(e.to_string())));
                        break;
                    }
                }
            }
        }
    }
}

/// Splits a result batch into finalized text (space-joined) and interim
/// text (concatenated, matching how providers stream partial spans).
fn partition(spans: &[SpeechSpan]) -> TranscriptChunk {
    let final_text = spans
        .iter()
        .filter(|s| s.is_final)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let interim_text: String = spans
        .iter()
        .filter(|s| !s.is_final)
        .map(|s| s.text.as_str())
        .collect();
    TranscriptChunk {
        is_final: !final_text.is_empty(),
        final_text,
        interim_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullRecognition;

    #[test]
    fn partition_splits_final_and_interim() {
        let chunk = partition(&[
            SpeechSpan::finalized("hello there"),
            SpeechSpan::interim("how ar"),
            SpeechSpan::finalized("general"),
        ]);
        assert_eq!(chunk.final_text, "hello there general");
        assert_eq!(chunk.interim_text, "how ar");
        assert!(chunk.is_final);
    }

    #[test]
    fn partition_with_only_interim_is_not_final() {
        let chunk = partition(&[SpeechSpan::interim("hel"), SpeechSpan::interim("lo")]);
        assert_eq!(chunk.final_text, "");
        assert_eq!(chunk.interim_text, "hello");
        assert!(!chunk.is_final);
    }

    #[test]
    fn partition_of_empty_batch_is_empty() {
        let chunk = partition(&[]);
        assert!(chunk.final_text.is_empty());
        assert!(chunk.interim_text.is_empty());
        assert!(!chunk.is_final);
    }

    #[tokio::test]
    async fn unsupported_backend_returns_false_without_error() {
        let recognizer = SpeechRecognizer::new(NullRecognition);
        assert!(!recognizer.is_supported());
        assert!(!recognizer.start());
        assert!(!recognizer.is_listening());
    }

    #[tokio::test]
    async fn stop_before_start_is_a_no_op() {
        let recognizer = SpeechRecognizer::new(NullRecognition);
        recognizer.stop();
        recognizer.stop();
        assert!(!recognizer.is_listening());
    }
}
