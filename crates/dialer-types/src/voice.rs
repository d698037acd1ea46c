//! Synthesis parameters and personality presets.
//!
//! A `VoicePreset` maps a personality tag to concrete speech-synthesis
//! parameters so the assistant keeps a consistent vocal style for the
//! whole call.

use serde::{Deserialize, Serialize};

/// Parameters applied to a single synthesized utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// Logical voice name, matched case-insensitively as a substring
    /// against the host's voice list. `"default"` selects the first
    /// available voice.
    pub voice_name: String,
    /// Speech rate multiplier (1.0 is normal).
    pub rate: f32,
    /// Pitch shift factor (1.0 is normal).
    pub pitch: f32,
    /// Playback volume in [0.0, 1.0].
    pub volume: f32,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            voice_name: "default".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SynthesisParams {
    /// Overrides the voice name, keeping the other parameters.
    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = voice_name.into();
        self
    }

    /// Overrides the speech rate.
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }
}

/// A named personality preset bundling synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreset {
    pub personality: &'static str,
    pub params: SynthesisParams,
}

/// The built-in personality presets.
pub fn voice_presets() -> Vec<VoicePreset> {
    [
        ("assistant", 1.0, 1.0, "default"),
        ("friendly", 0.95, 1.1, "Google US English"),
        ("professional", 0.9, 0.95, "Microsoft David"),
        ("energetic", 1.1, 1.15, "Google UK English Female"),
        ("calm", 0.85, 0.9, "Microsoft Zira"),
    ]
    .into_iter()
    .map(|(personality, rate, pitch, voice)| VoicePreset {
        personality,
        params: SynthesisParams {
            voice_name: voice.to_string(),
            rate,
            pitch,
            volume: 1.0,
        },
    })
    .collect()
}

impl SynthesisParams {
    /// Looks up the preset for a personality tag.
    ///
    /// Unknown tags fall back to the neutral `assistant` preset so a
    /// misconfigured personality never breaks speech output.
    pub fn for_personality(tag: &str) -> Self {
        voice_presets()
            .into_iter()
            .find(|preset| preset.personality == tag)
            .map(|preset| preset.params)
            .unwrap_or_default()
    }
}
