//! Auto-restart and stop semantics of the recognizer, driven by a
//! scripted capture backend.

use dialer_voice::{
    CaptureEvent, RecognitionBackend, RecognitionError, RecognizerEvent, SpeechRecognizer,
    SpeechSpan, VoiceError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted capture session: the events it emits, and whether the
/// channel stays open afterwards (until `stop_capture`).
struct Session {
    events: Vec<CaptureEvent>,
    stays_open: bool,
}

#[derive(Default)]
struct ScriptState {
    sessions: Mutex<VecDeque<Session>>,
    open_senders: Mutex<Vec<mpsc::Sender<CaptureEvent>>>,
    successful_starts: AtomicUsize,
}

/// Backend that replays scripted capture sessions. Once the script is
/// exhausted, further starts fail — which is how the tests provoke a
/// restart failure.
#[derive(Clone)]
struct ScriptedRecognition {
    state: Arc<ScriptState>,
}

impl ScriptedRecognition {
    fn new(sessions: Vec<Session>) -> Self {
        Self {
            state: Arc::new(ScriptState {
                sessions: Mutex::new(sessions.into()),
                ..Default::default()
            }),
        }
    }
}

impl RecognitionBackend for ScriptedRecognition {
    fn start_capture(&self) -> Result<mpsc::Receiver<CaptureEvent>, VoiceError> {
        let session = self
            .state
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| VoiceError::Recognition("capture unavailable".to_string()))?;

        self.state.successful_starts.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        if session.stays_open {
            self.state.open_senders.lock().unwrap().push(tx.clone());
        }
        tokio::spawn(async move {
            for event in session.events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            // tx drops here; a session that stays open is kept alive by
            // the clone stashed in open_senders.
        });
        Ok(rx)
    }

    fn stop_capture(&self) {
        self.state.open_senders.lock().unwrap().clear();
    }
}

fn results(spans: Vec<SpeechSpan>) -> CaptureEvent {
    CaptureEvent::Results(spans)
}

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<RecognizerEvent>) -> RecognizerEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for recognizer event")
        .expect("recognizer event channel closed")
}

#[tokio::test]
async fn restarts_after_unexpected_termination() {
    let backend = ScriptedRecognition::new(vec![
        Session {
            events: vec![results(vec![SpeechSpan::finalized("hello")])],
            stays_open: false,
        },
        Session {
            events: vec![results(vec![SpeechSpan::interim("wor")])],
            stays_open: false,
        },
    ]);
    let state = Arc::clone(&backend.state);

    let recognizer = SpeechRecognizer::new(backend);
    let mut rx = recognizer.subscribe();
    assert!(recognizer.start());

    // First session's result, then the session closes and the
    // recognizer restarts into the second without caller help.
    match next_event(&mut rx).await {
        RecognizerEvent::Transcript(chunk) => {
            assert_eq!(chunk.final_text, "hello");
            assert!(chunk.is_final);
        }
        other => panic!("expected transcript, got {other:?}"),
    }
    match next_event(&mut rx).await {
        RecognizerEvent::Transcript(chunk) => {
            assert_eq!(chunk.interim_text, "wor");
            assert!(!chunk.is_final);
        }
        other => panic!("expected transcript, got {other:?}"),
    }

    // Script exhausted: the next restart fails, which surfaces as an
    // error event and stops listening.
    match next_event(&mut rx).await {
        RecognizerEvent::Error(RecognitionError::Other(_)) => {}
        other => panic!("expected restart failure, got {other:?}"),
    }
    assert!(!recognizer.is_listening());
    assert_eq!(state.successful_starts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn provider_errors_are_forwarded_without_ending_the_session() {
    let backend = ScriptedRecognition::new(vec![Session {
        events: vec![
            CaptureEvent::Error(RecognitionError::NoSpeech),
            results(vec![SpeechSpan::finalized("still here")]),
        ],
        stays_open: true,
    }]);

    let recognizer = SpeechRecognizer::new(backend);
    let mut rx = recognizer.subscribe();
    assert!(recognizer.start());

    match next_event(&mut rx).await {
        RecognizerEvent::Error(RecognitionError::NoSpeech) => {}
        other => panic!("expected no-speech error, got {other:?}"),
    }
    match next_event(&mut rx).await {
        RecognizerEvent::Transcript(chunk) => assert_eq!(chunk.final_text, "still here"),
        other => panic!("expected transcript, got {other:?}"),
    }
    assert!(recognizer.is_listening());
}

#[tokio::test]
async fn stop_is_idempotent_and_suppresses_restart() {
    let backend = ScriptedRecognition::new(vec![
        Session {
            events: vec![results(vec![SpeechSpan::finalized("one")])],
            stays_open: true,
        },
        // A spare session the recognizer must NOT consume after stop.
        Session {
            events: Vec::new(),
            stays_open: true,
        },
    ]);
    let state = Arc::clone(&backend.state);

    let recognizer = SpeechRecognizer::new(backend);
    let mut rx = recognizer.subscribe();
    assert!(recognizer.start());

    match next_event(&mut rx).await {
        RecognizerEvent::Transcript(_) => {}
        other => panic!("expected transcript, got {other:?}"),
    }

    recognizer.stop();
    recognizer.stop();
    assert!(!recognizer.is_listening());

    // Give a hypothetical stray restart a chance to happen.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(state.successful_starts.load(Ordering::SeqCst), 1);
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn start_while_listening_is_a_no_op() {
    let backend = ScriptedRecognition::new(vec![Session {
        events: Vec::new(),
        stays_open: true,
    }]);
    let state = Arc::clone(&backend.state);

    let recognizer = SpeechRecognizer::new(backend);
    assert!(recognizer.start());
    assert!(recognizer.start());
    assert_eq!(state.successful_starts.load(Ordering::SeqCst), 1);
}
