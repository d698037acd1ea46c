//! Screen flow orchestration over the session store and voice engines.

use dialer_client::{ApiClient, ClientError};
use dialer_session::{CallAction, CallSession, CallSessionStore};
use dialer_types::{CallState, ExportFormat, Message, PreferencesPatch, Role, RoutedAgent, SynthesisParams};
use dialer_voice::{
    AudioLevelSampler, CaptureGraphBackend, RecognitionBackend, RecognizerEvent,
    SpeechRecognizer, SpeechSynthesizer, SynthesisBackend,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Delay between `StartCall` and the simulated `CallConnected`.
pub const CONNECT_DELAY: Duration = Duration::from_millis(1000);
/// Delay between `EndCall` and the automatic `ResetCall`.
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

/// Rate applied when speaking assistant replies.
const REPLY_SPEECH_RATE: f32 = 0.95;

/// Inline assistant turn appended when the chat request fails.
const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// The four screens of the call flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Request,
    Call,
    Settings,
}

/// Drives the screen flow: Welcome → Request → Call, with Settings as a
/// side trip from Request.
///
/// Owns the session store, the voice engines, and the API client, and
/// sequences them the same way on every path: routing failures still
/// reach the call screen (with the fallback agent), chat failures turn
/// into an inline apology, and a missing voice capability degrades to
/// text-only without an error. The screen itself is published through a
/// watch channel so observers see the transition driven by the delayed
/// reset.
pub struct ScreenController<R, S, C: CaptureGraphBackend> {
    screen_tx: watch::Sender<Screen>,
    store: CallSessionStore,
    api: ApiClient,
    recognizer: SpeechRecognizer<R>,
    synthesizer: Arc<SpeechSynthesizer<S>>,
    sampler: AudioLevelSampler<C>,
    agent: Option<RoutedAgent>,
    processing: bool,
    connect_delay: Duration,
    reset_delay: Duration,
}

impl<R, S, C> ScreenController<R, S, C>
where
    R: RecognitionBackend + 'static,
    S: SynthesisBackend + 'static,
    C: CaptureGraphBackend,
{
    pub fn new(
        store: CallSessionStore,
        api: ApiClient,
        recognizer: SpeechRecognizer<R>,
        synthesizer: SpeechSynthesizer<S>,
        sampler: AudioLevelSampler<C>,
    ) -> Self {
        let (screen_tx, _) = watch::channel(Screen::Welcome);
        Self {
            screen_tx,
            store,
            api,
            recognizer,
            synthesizer: Arc::new(synthesizer),
            sampler,
            agent: None,
            processing: false,
            connect_delay: CONNECT_DELAY,
            reset_delay: RESET_DELAY,
        }
    }

    /// Overrides the simulated connect and reset delays.
    pub fn with_delays(mut self, connect: Duration, reset: Duration) -> Self {
        self.connect_delay = connect;
        self.reset_delay = reset;
        self
    }

    /// The currently displayed screen.
    pub fn screen(&self) -> Screen {
        *self.screen_tx.borrow()
    }

    /// Subscribes to screen transitions, including the one driven by the
    /// delayed post-call reset.
    pub fn watch_screen(&self) -> watch::Receiver<Screen> {
        self.screen_tx.subscribe()
    }

    /// The agent the active call was routed to, if any.
    pub fn agent(&self) -> Option<&RoutedAgent> {
        self.agent.as_ref()
    }

    /// A snapshot of the current session state.
    pub fn session(&self) -> CallSession {
        self.store.state()
    }

    /// The underlying session store, for subscribing to state changes.
    pub fn store(&self) -> &CallSessionStore {
        &self.store
    }

    /// Subscribes to recognizer transcript and error events.
    pub fn recognizer_events(&self) -> broadcast::Receiver<RecognizerEvent> {
        self.recognizer.subscribe()
    }

    /// Welcome → Request.
    pub fn continue_from_welcome(&mut self) {
        if self.screen() == Screen::Welcome {
            self.screen_tx.send_replace(Screen::Request);
        }
    }

    /// Request → Settings.
    pub fn open_settings(&mut self) {
        if self.screen() == Screen::Request {
            self.screen_tx.send_replace(Screen::Settings);
        }
    }

    /// Settings → Request.
    pub fn close_settings(&mut self) {
        if self.screen() == Screen::Settings {
            self.screen_tx.send_replace(Screen::Request);
        }
    }

    /// Call → Request. Only honored while no call is in progress.
    pub fn back_to_request(&mut self) {
        if self.screen() == Screen::Call && self.store.state().call_state == CallState::Idle {
            self.agent = None;
            self.screen_tx.send_replace(Screen::Request);
        }
    }

    /// Routes a call request and runs the connect sequence.
    ///
    /// Routing never blocks the flow: a remote failure substitutes the
    /// fixed fallback agent and the call proceeds identically. The call
    /// connects after [`CONNECT_DELAY`] (or the override), then the
    /// agent's greeting is appended and, in unmuted voice mode, spoken.
    pub async fn submit_request(&mut self, request: &str) {
        if self.screen() != Screen::Request || request.trim().is_empty() {
            return;
        }
        if self.store.state().call_state != CallState::Idle {
            return;
        }

        let routed = self.api.route_call(request).await;
        info!(
            agent = %routed.agent.name,
            department = %routed.agent.department,
            "call routed"
        );
        self.agent = Some(routed.clone());
        self.screen_tx.send_replace(Screen::Call);

        self.store.dispatch(CallAction::StartCall);
        tokio::time::sleep(self.connect_delay).await;
        self.store.dispatch(CallAction::CallConnected);

        let state = self.store.state();
        if state.is_voice_mode {
            self.begin_voice_capture();
        }

        let greeting = if routed.greeting.trim().is_empty() {
            format!(
                "Hello {}, how can I assist you today?",
                state.user_preferences.name
            )
        } else {
            routed.greeting
        };
        self.store.dispatch(CallAction::AddMessage(Message::new(
            Role::Assistant,
            greeting.clone(),
            now_ms(),
        )));
        if state.is_voice_mode && !state.is_muted {
            let synth = Arc::clone(&self.synthesizer);
            let personality = state.ai_personality.clone();
            // Greeting playback runs concurrently with the call screen.
            tokio::spawn(async move {
                if let Err(e) = synth.speak_as(&greeting, &personality).await {
                    debug!(error = %e, "greeting speech unavailable");
                }
            });
        }
    }

    /// Appends a user turn and requests the assistant's reply.
    ///
    /// Blank input and input arriving while a previous turn is still in
    /// flight are ignored. A chat failure appends a fixed apology turn
    /// instead of surfacing the error. In unmuted voice mode the reply
    /// is spoken with the user's voice preference.
    pub async fn handle_user_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || self.processing {
            return;
        }
        if self.store.state().call_state != CallState::Active {
            return;
        }
        self.processing = true;

        let state = self.store.state();
        let history = state.conversation.clone();
        self.store.dispatch(CallAction::AddMessage(Message::new(
            Role::User,
            text,
            now_ms(),
        )));

        match self
            .api
            .chat(text, &history, &state.ai_personality, &state.user_preferences)
            .await
        {
            Ok(reply) => {
                self.store.dispatch(CallAction::AddMessage(Message::new(
                    Role::Assistant,
                    reply.clone(),
                    now_ms(),
                )));
                if state.is_voice_mode && !state.is_muted {
                    let params = SynthesisParams::default()
                        .with_voice(state.user_preferences.voice_preference.clone())
                        .with_rate(REPLY_SPEECH_RATE);
                    if let Err(e) = self.synthesizer.speak(&reply, &params).await {
                        debug!(error = %e, "reply speech unavailable");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.store.dispatch(CallAction::AddMessage(Message::new(
                    Role::Assistant,
                    CHAT_APOLOGY,
                    now_ms(),
                )));
            }
        }
        self.processing = false;
    }

    /// Ends the active call.
    ///
    /// Voice engines stop before the state changes, then `EndCall` is
    /// dispatched; after [`RESET_DELAY`] (or the override) `ResetCall`
    /// is dispatched automatically and the screen returns to Request.
    pub fn end_call(&mut self) {
        if !matches!(
            self.store.state().call_state,
            CallState::Connecting | CallState::Active
        ) {
            return;
        }

        self.recognizer.stop();
        self.synthesizer.stop();
        self.sampler.stop_microphone_capture();
        self.store.dispatch(CallAction::EndCall);
        self.agent = None;

        let store = self.store.clone();
        let screen_tx = self.screen_tx.clone();
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.dispatch(CallAction::ResetCall);
            screen_tx.send_replace(Screen::Request);
        });
    }

    /// Toggles mute, pausing or resuming the in-progress utterance.
    pub fn toggle_mute(&mut self) {
        let was_muted = self.store.state().is_muted;
        self.store.dispatch(CallAction::ToggleMute);
        if was_muted {
            self.synthesizer.resume();
        } else {
            self.synthesizer.pause();
        }
    }

    /// Toggles between voice and text mode, stopping or starting the
    /// capture engines accordingly.
    pub fn toggle_voice_mode(&mut self) {
        let was_voice = self.store.state().is_voice_mode;
        self.store.dispatch(CallAction::ToggleVoiceMode);
        if was_voice {
            self.recognizer.stop();
            self.sampler.stop_microphone_capture();
        } else if self.store.state().call_state == CallState::Active {
            self.begin_voice_capture();
        }
    }

    /// Toggles the transcript panel.
    pub fn toggle_transcript(&mut self) {
        self.store.dispatch(CallAction::ToggleTranscript);
    }

    /// Sets the agent personality for subsequent turns.
    pub fn set_personality(&mut self, tag: impl Into<String>) {
        self.store.dispatch(CallAction::SetPersonality(tag.into()));
    }

    /// Applies a partial preference update.
    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        self.store.dispatch(CallAction::UpdatePreferences(patch));
    }

    /// Exports the current conversation, falling back to a local
    /// rendering when the remote endpoint fails.
    pub async fn export_transcript(&self, format: ExportFormat) -> Result<Vec<u8>, ClientError> {
        let conversation = self.store.state().conversation;
        self.api.export_transcript(&conversation, format).await
    }

    /// Volume buckets for waveform rendering: live microphone levels
    /// while capture is active, the idle animation otherwise.
    pub fn waveform_bars(&mut self, bar_count: usize) -> Vec<f32> {
        if self.sampler.is_active() {
            self.sampler.normalized_bars(bar_count)
        } else {
            self.sampler.idle_bars(bar_count).to_vec()
        }
    }

    fn begin_voice_capture(&mut self) {
        if self.sampler.init() && self.sampler.start_microphone_capture() {
            debug!("microphone capture running");
        }
        if !self.recognizer.start() {
            debug!("speech recognition unavailable, text input only");
        }
    }
}

/// Formats a call duration as `MM:SS`.
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialer_client::ApiClient;
    use dialer_voice::{NullCaptureGraph, NullRecognition, NullSynthesis};

    fn controller() -> ScreenController<NullRecognition, NullSynthesis, NullCaptureGraph> {
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_millis(200)).unwrap();
        ScreenController::new(
            CallSessionStore::new(),
            api,
            SpeechRecognizer::new(NullRecognition),
            SpeechSynthesizer::new(NullSynthesis::default()),
            AudioLevelSampler::new(NullCaptureGraph),
        )
    }

    #[tokio::test]
    async fn screen_flow_gates_each_transition() {
        let mut c = controller();
        assert_eq!(c.screen(), Screen::Welcome);

        // Settings is only reachable from Request.
        c.open_settings();
        assert_eq!(c.screen(), Screen::Welcome);

        c.continue_from_welcome();
        assert_eq!(c.screen(), Screen::Request);

        c.open_settings();
        assert_eq!(c.screen(), Screen::Settings);
        c.close_settings();
        assert_eq!(c.screen(), Screen::Request);
    }

    #[tokio::test]
    async fn blank_request_is_ignored() {
        let mut c = controller();
        c.continue_from_welcome();
        c.submit_request("   ").await;
        assert_eq!(c.screen(), Screen::Request);
        assert_eq!(c.session().call_state, CallState::Idle);
    }

    #[tokio::test]
    async fn request_from_the_wrong_screen_is_ignored() {
        let mut c = controller();
        c.submit_request("I need help").await;
        assert_eq!(c.screen(), Screen::Welcome);
        assert_eq!(c.session().call_state, CallState::Idle);
    }

    #[tokio::test]
    async fn end_call_without_a_call_is_a_no_op() {
        let mut c = controller();
        c.end_call();
        assert_eq!(c.session().call_state, CallState::Idle);
    }

    #[tokio::test]
    async fn message_outside_an_active_call_is_ignored() {
        let mut c = controller();
        c.handle_user_message("hello?").await;
        assert!(c.session().conversation.is_empty());
    }

    #[test]
    fn duration_formats_as_minutes_and_seconds() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(61), "01:01");
        assert_eq!(format_duration(725), "12:05");
    }
}
