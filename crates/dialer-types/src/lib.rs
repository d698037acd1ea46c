//! Shared types and constants for the Dialer call-session core.
//!
//! This crate provides the foundational types used across all Dialer
//! crates: the call lifecycle enum, conversation messages, user
//! preferences, routed-agent profiles, transcript export formats, and
//! speech-synthesis parameters.
//!
//! No crate in the workspace depends on anything *except* `dialer-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

pub mod voice;

use serde::{Deserialize, Serialize};

pub use voice::{SynthesisParams, VoicePreset};

/// Lifecycle state of a call session.
///
/// Advanced only by dispatching `CallAction`s through the session store;
/// nothing else mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call in progress.
    #[default]
    Idle,
    /// Call started, waiting for the simulated connection.
    Connecting,
    /// Call connected; the duration ticker runs only in this state.
    Active,
    /// Call ended, awaiting reset.
    Ended,
}

impl CallState {
    /// Returns the canonical string label for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human caller.
    User,
    /// The simulated agent.
    Assistant,
}

impl Role {
    /// Uppercase label used by the plain-text transcript export.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
        }
    }

    /// Display name used by the markdown transcript export.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "AI Assistant",
        }
    }
}

/// A single conversation turn.
///
/// Immutable once appended to a session's conversation log; export
/// operations read the ordered sequence without mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp_ms,
        }
    }
}

/// Durable user preferences, persisted to the local preference cache
/// across sessions and surviving call resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub name: String,
    pub avatar: Option<String>,
    pub voice_preference: String,
    pub tone: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            avatar: None,
            voice_preference: "default".to_string(),
            tone: "professional".to_string(),
        }
    }
}

/// A partial preference update. Only the populated fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub voice_preference: Option<String>,
    pub tone: Option<String>,
}

impl UserPreferences {
    /// Merges a patch into these preferences, field-wise.
    pub fn merge(&self, patch: &PreferencesPatch) -> Self {
        Self {
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            avatar: patch.avatar.clone().or_else(|| self.avatar.clone()),
            voice_preference: patch
                .voice_preference
                .clone()
                .unwrap_or_else(|| self.voice_preference.clone()),
            tone: patch.tone.clone().unwrap_or_else(|| self.tone.clone()),
        }
    }
}

/// The simulated agent persona a call is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub title: String,
    pub department: String,
}

/// The organization a routed agent belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response of the remote routing call: which agent persona answers,
/// its opening line, and the organization it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedAgent {
    pub agent: AgentProfile,
    pub greeting: String,
    pub organization: Organization,
}

/// Supported transcript export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain text, one `[HH:MM:SS] ROLE: content` block per turn.
    Txt,
    /// Pretty-printed JSON array of message objects.
    Json,
    /// Markdown with a heading, date line, and per-turn sections.
    Md,
}

impl ExportFormat {
    /// Returns the format tag, which doubles as the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Md => "md",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ParseExportFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "md" => Ok(Self::Md),
            _ => Err(ParseExportFormatError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown export format tag.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown export format: {0}")]
pub struct ParseExportFormatError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_wire_field_names() {
        let msg = Message::new(Role::User, "Hi", 1000);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hi");
        assert_eq!(json["timestamp"], 1000);
    }

    #[test]
    fn message_round_trips() {
        let msg = Message::new(Role::Assistant, "Hello, how can I help you today?", 42);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn preferences_merge_applies_only_populated_fields() {
        let prefs = UserPreferences::default();
        let patch = PreferencesPatch {
            name: Some("Ada".to_string()),
            tone: Some("friendly".to_string()),
            ..Default::default()
        };
        let merged = prefs.merge(&patch);
        assert_eq!(merged.name, "Ada");
        assert_eq!(merged.tone, "friendly");
        assert_eq!(merged.voice_preference, "default");
        assert_eq!(merged.avatar, None);
    }

    #[test]
    fn preferences_merge_with_empty_patch_is_identity() {
        let prefs = UserPreferences {
            name: "Grace".to_string(),
            avatar: Some("grace.png".to_string()),
            voice_preference: "zira".to_string(),
            tone: "calm".to_string(),
        };
        assert_eq!(prefs.merge(&PreferencesPatch::default()), prefs);
    }

    #[test]
    fn export_format_parses_known_tags() {
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Md);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn call_state_labels_are_stable() {
        assert_eq!(CallState::Idle.as_str(), "idle");
        assert_eq!(CallState::Connecting.as_str(), "connecting");
        assert_eq!(CallState::Active.as_str(), "active");
        assert_eq!(CallState::Ended.as_str(), "ended");
    }

    #[test]
    fn organization_uses_type_on_the_wire() {
        let org = Organization {
            name: "AI Assistant".to_string(),
            kind: "general".to_string(),
        };
        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["type"], "general");
    }
}
