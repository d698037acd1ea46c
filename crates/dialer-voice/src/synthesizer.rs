//! Text-to-speech coordination: one utterance at a time, last call wins.

use crate::backend::{SynthesisBackend, UtteranceOutcome, Voice};
use crate::error::VoiceError;
use dialer_types::SynthesisParams;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Wraps a text-to-speech capability.
///
/// At most one utterance is active at any time: a new [`speak`] call
/// first cancels the in-flight utterance. Cancellation of a superseded
/// utterance resolves its caller's future successfully, since being
/// replaced is the expected consequence of newer speech, not a failure.
///
/// [`speak`]: SpeechSynthesizer::speak
pub struct SpeechSynthesizer<B> {
    backend: B,
    voices_rx: Mutex<watch::Receiver<Vec<Voice>>>,
}

impl<B: SynthesisBackend> SpeechSynthesizer<B> {
    pub fn new(backend: B) -> Self {
        let voices_rx = Mutex::new(backend.voices());
        Self { backend, voices_rx }
    }

    /// Whether the host supports speech synthesis.
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Speaks `text`, resolving when playback completes.
    ///
    /// Empty or whitespace-only text resolves immediately. Any prior
    /// utterance is cancelled first (its own `speak` future resolves
    /// `Ok`). Synthesis failures other than cancellation are returned
    /// as errors.
    pub async fn speak(&self, text: &str, params: &SynthesisParams) -> Result<(), VoiceError> {
        if text.trim().is_empty() {
            return Ok(());
        }

        // Last call wins: supersede whatever is in flight.
        self.backend.cancel();

        let voice = self.resolve_voice(&params.voice_name);
        let outcome_rx = self.backend.speak(text, params, voice.as_ref())?;

        match outcome_rx.await {
            Ok(UtteranceOutcome::Completed) => Ok(()),
            Ok(UtteranceOutcome::Cancelled) => {
                debug!("utterance superseded, treating as completed");
                Ok(())
            }
            Ok(UtteranceOutcome::Failed(reason)) => Err(VoiceError::Synthesis(reason)),
            // The backend dropped the channel; same contract as an
            // explicit cancellation.
            Err(_) => Ok(()),
        }
    }

    /// Speaks with the preset parameters for a personality tag.
    pub async fn speak_as(&self, text: &str, personality: &str) -> Result<(), VoiceError> {
        self.speak(text, &SynthesisParams::for_personality(personality))
            .await
    }

    /// Cancels the in-flight utterance, if any.
    pub fn stop(&self) {
        self.backend.cancel();
    }

    /// Pauses the in-progress utterance. No effect otherwise.
    pub fn pause(&self) {
        self.backend.pause();
    }

    /// Resumes a paused utterance. No effect otherwise.
    pub fn resume(&self) {
        self.backend.resume();
    }

    /// The current voice list, refreshed from the host's latest
    /// revision (some hosts populate the list asynchronously).
    pub fn voices(&self) -> Vec<Voice> {
        let mut rx = self.voices_rx.lock().expect("voices lock poisoned");
        let voices = rx.borrow_and_update().clone();
        voices
    }

    /// Resolves a logical voice name against the available voices.
    ///
    /// `"default"` selects the host default (or the first voice);
    /// anything else matches case-insensitively as a substring, falling
    /// back to the default voice when nothing matches.
    pub fn resolve_voice(&self, voice_name: &str) -> Option<Voice> {
        let voices = self.voices();
        if voices.is_empty() {
            return None;
        }

        let default = voices
            .iter()
            .find(|v| v.is_default)
            .or_else(|| voices.first())
            .cloned();

        if voice_name == "default" {
            return default;
        }

        let wanted = voice_name.to_lowercase();
        voices
            .iter()
            .find(|v| v.name.to_lowercase().contains(&wanted))
            .cloned()
            .or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullSynthesis;
    use tokio::sync::oneshot;

    struct VoiceListOnly {
        voices_tx: watch::Sender<Vec<Voice>>,
    }

    impl VoiceListOnly {
        fn new(voices: Vec<Voice>) -> Self {
            let (voices_tx, _) = watch::channel(voices);
            Self { voices_tx }
        }
    }

    impl SynthesisBackend for VoiceListOnly {
        fn voices(&self) -> watch::Receiver<Vec<Voice>> {
            self.voices_tx.subscribe()
        }

        fn speak(
            &self,
            _text: &str,
            _params: &SynthesisParams,
            _voice: Option<&Voice>,
        ) -> Result<oneshot::Receiver<UtteranceOutcome>, VoiceError> {
            let (tx, rx) = oneshot::channel();
            tx.send(UtteranceOutcome::Completed).ok();
            Ok(rx)
        }

        fn pause(&self) {}
        fn resume(&self) {}
        fn cancel(&self) {}
    }

    fn voice(name: &str, is_default: bool) -> Voice {
        Voice {
            name: name.to_string(),
            lang: "en-US".to_string(),
            is_default,
        }
    }

    #[tokio::test]
    async fn empty_text_resolves_immediately() {
        let synth = SpeechSynthesizer::new(NullSynthesis::default());
        assert!(synth.speak("   ", &SynthesisParams::default()).await.is_ok());
    }

    #[test]
    fn default_voice_name_selects_host_default() {
        let synth = SpeechSynthesizer::new(VoiceListOnly::new(vec![
            voice("Microsoft David", false),
            voice("Google US English", true),
        ]));
        let resolved = synth.resolve_voice("default").unwrap();
        assert_eq!(resolved.name, "Google US English");
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let synth = SpeechSynthesizer::new(VoiceListOnly::new(vec![
            voice("Google US English", true),
            voice("Microsoft Zira Desktop", false),
        ]));
        let resolved = synth.resolve_voice("zira").unwrap();
        assert_eq!(resolved.name, "Microsoft Zira Desktop");
    }

    #[test]
    fn unmatched_name_falls_back_to_default_voice() {
        let synth = SpeechSynthesizer::new(VoiceListOnly::new(vec![
            voice("Microsoft David", false),
            voice("Google UK English Female", true),
        ]));
        let resolved = synth.resolve_voice("nonexistent voice").unwrap();
        assert_eq!(resolved.name, "Google UK English Female");
    }

    #[test]
    fn empty_voice_list_resolves_to_none() {
        let synth = SpeechSynthesizer::new(VoiceListOnly::new(Vec::new()));
        assert!(synth.resolve_voice("default").is_none());
    }

    #[test]
    fn voice_list_refreshes_when_the_host_updates_it() {
        let backend = VoiceListOnly::new(Vec::new());
        let tx = backend.voices_tx.clone();
        let synth = SpeechSynthesizer::new(backend);
        assert!(synth.voices().is_empty());

        tx.send(vec![voice("Google US English", true)]).unwrap();
        assert_eq!(synth.voices().len(), 1);
        assert_eq!(
            synth.resolve_voice("google us").unwrap().name,
            "Google US English"
        );
    }
}
