mod adapter;
mod blender;
mod profiles;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use adapter::{AccentAdaptation, AccentAdapter, PhonemeContext};
pub use blender::{AccentTransitionBlender, BlendedAccentProfile};
pub use profiles::AccentProfileStore;

/// How emphasis is expressed through head movement.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmphasisStyle {
    Subtle,
    #[default]
    Moderate,
    Expressive,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HeadMovementStyle {
    /// Nods per utterance tendency, 0..1.
    pub nod_frequency: f32,
    /// Preference for head tilts over turns, 0..1.
    pub tilt_tendency: f32,
    pub emphasis_style: EmphasisStyle,
}

impl Default for HeadMovementStyle {
    fn default() -> Self {
        Self {
            nod_frequency: 0.5,
            tilt_tendency: 0.5,
            emphasis_style: EmphasisStyle::default(),
        }
    }
}

/// Reference tempo against which profile bpm is interpreted.
pub const REFERENCE_BPM: f32 = 120.0;
/// Reference mean pause used to derive the pause multiplier.
pub const REFERENCE_PAUSE_MS: f64 = 350.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RhythmPattern {
    pub bpm: f32,
    /// Per-syllable stress weights around 1.0.
    pub stress_pattern: Vec<f32>,
    /// Typical pause lengths in ms (word-level, sentence-level).
    pub pause_durations: Vec<f64>,
}

impl RhythmPattern {
    /// Duration multiplier applied to every unit: faster tempo, shorter units.
    pub fn speech_rate_multiplier(&self) -> f32 {
        if self.bpm > 0.0 {
            REFERENCE_BPM / self.bpm
        } else {
            1.0
        }
    }

    /// Duration multiplier applied to silence units only.
    pub fn pause_multiplier(&self) -> f64 {
        if self.pause_durations.is_empty() {
            return 1.0;
        }
        let mean: f64 =
            self.pause_durations.iter().sum::<f64>() / self.pause_durations.len() as f64;
        mean / REFERENCE_PAUSE_MS
    }

    /// Mean stress weight, applied to vowel durations.
    pub fn syllable_stress_ratio(&self) -> f32 {
        if self.stress_pattern.is_empty() {
            return 1.0;
        }
        self.stress_pattern.iter().sum::<f32>() / self.stress_pattern.len() as f32
    }
}

impl Default for RhythmPattern {
    fn default() -> Self {
        Self {
            bpm: REFERENCE_BPM,
            stress_pattern: vec![1.0],
            pause_durations: vec![200.0, 500.0],
        }
    }
}

/// Duration/intensity rescale for phonemes matching one symbol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StressRule {
    pub symbol: String,
    pub duration_scale: f32,
    pub intensity_boost: f32,
}

/// Probability-gated contextual phoneme substitution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContextRule {
    pub from: String,
    pub to: String,
    pub context: PhonemeContext,
    pub probability: f32,
    pub confidence: f32,
}

/// Language/region pronunciation, rhythm and head-movement-style rules.
/// Immutable value looked up from the fixed profile table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AccentProfile {
    pub language: String,
    pub region: String,
    pub vowel_map: BTreeMap<String, String>,
    pub consonant_map: BTreeMap<String, String>,
    pub rhythm: RhythmPattern,
    pub context_rules: Vec<ContextRule>,
    pub stress_rules: Vec<StressRule>,
    pub head_style: HeadMovementStyle,
}

impl AccentProfile {
    /// Neutral profile: no substitutions, reference rhythm.
    pub fn neutral(language: &str) -> Self {
        Self {
            language: language.to_owned(),
            region: String::new(),
            vowel_map: BTreeMap::new(),
            consonant_map: BTreeMap::new(),
            rhythm: RhythmPattern::default(),
            context_rules: Vec::new(),
            stress_rules: Vec::new(),
            head_style: HeadMovementStyle::default(),
        }
    }
}
