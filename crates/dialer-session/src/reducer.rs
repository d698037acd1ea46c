//! The call session state and its pure reducer.

use dialer_types::{CallState, Message, PreferencesPatch, UserPreferences};
use serde::{Deserialize, Serialize};

/// The in-memory record of one simulated conversation, from start to
/// reset. One instance per controller; constructed on screen mount and
/// dropped on unmount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSession {
    pub call_state: CallState,
    pub is_voice_mode: bool,
    pub is_muted: bool,
    pub show_transcript: bool,
    /// Ordered conversation log. Append-only within a session; cleared
    /// on reset.
    pub conversation: Vec<Message>,
    /// Seconds the call has been active. Changes only via
    /// `CallAction::UpdateDuration`.
    pub call_duration_secs: u64,
    pub ai_personality: String,
    pub user_preferences: UserPreferences,
}

impl Default for CallSession {
    fn default() -> Self {
        Self {
            call_state: CallState::Idle,
            is_voice_mode: true,
            is_muted: false,
            show_transcript: false,
            conversation: Vec::new(),
            call_duration_secs: 0,
            ai_personality: "assistant".to_string(),
            user_preferences: UserPreferences::default(),
        }
    }
}

/// The complete set of session transitions.
///
/// Every state change goes through exactly one of these variants; the
/// reducer match is exhaustive so adding a variant without handling it
/// is a compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum CallAction {
    StartCall,
    CallConnected,
    EndCall,
    /// Returns to `Idle` with an empty conversation and zero duration.
    /// User preferences survive.
    ResetCall,
    ToggleVoiceMode,
    ToggleMute,
    ToggleTranscript,
    AddMessage(Message),
    UpdateDuration(u64),
    SetPersonality(String),
    UpdatePreferences(PreferencesPatch),
}

/// Produces the next session state from the previous state and an
/// action. Pure: no clocks, no I/O, deterministic for a given input.
pub fn reduce(state: &CallSession, action: &CallAction) -> CallSession {
    let mut next = state.clone();
    match action {
        CallAction::StartCall => next.call_state = CallState::Connecting,
        CallAction::CallConnected => next.call_state = CallState::Active,
        CallAction::EndCall => next.call_state = CallState::Ended,
        CallAction::ResetCall => {
            next.call_state = CallState::Idle;
            next.call_duration_secs = 0;
            next.conversation.clear();
        }
        CallAction::ToggleVoiceMode => next.is_voice_mode = !state.is_voice_mode,
        CallAction::ToggleMute => next.is_muted = !state.is_muted,
        CallAction::ToggleTranscript => next.show_transcript = !state.show_transcript,
        CallAction::AddMessage(msg) => next.conversation.push(msg.clone()),
        CallAction::UpdateDuration(secs) => next.call_duration_secs = *secs,
        CallAction::SetPersonality(tag) => next.ai_personality = tag.clone(),
        CallAction::UpdatePreferences(patch) => {
            next.user_preferences = state.user_preferences.merge(patch);
        }
    }
    next
}
