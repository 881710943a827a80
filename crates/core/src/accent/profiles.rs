//! Fixed per-language accent profile table. Read-only after construction and
//! freely shareable between components.

use crate::accent::{
    AccentProfile, ContextRule, EmphasisStyle, HeadMovementStyle, PhonemeContext, RhythmPattern,
    StressRule,
};
use crate::config::LanguageCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub struct AccentProfileStore {
    profiles: HashMap<String, Arc<AccentProfile>>,
}

impl AccentProfileStore {
    /// Store with the built-in language set: en, es, fr, de, ja.
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        for profile in [english(), spanish(), french(), german(), japanese()] {
            profiles.insert(profile.language.clone(), Arc::new(profile));
        }
        Self { profiles }
    }

    /// Lookup by primary subtag: "es-MX" resolves through "es".
    pub fn get(&self, language: &LanguageCode) -> Option<Arc<AccentProfile>> {
        self.profiles
            .get(language.as_str())
            .or_else(|| self.profiles.get(language.primary()))
            .cloned()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl Default for AccentProfileStore {
    fn default() -> Self {
        Self::builtin()
    }
}

fn vowel_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn english() -> AccentProfile {
    AccentProfile {
        language: "en".to_owned(),
        region: "US".to_owned(),
        vowel_map: BTreeMap::new(),
        consonant_map: BTreeMap::new(),
        rhythm: RhythmPattern {
            bpm: 120.0,
            stress_pattern: vec![1.0, 0.9, 1.1],
            pause_durations: vec![200.0, 500.0],
        },
        context_rules: vec![ContextRule {
            from: "T".to_owned(),
            to: "D".to_owned(),
            context: PhonemeContext::Vowel,
            probability: 0.3,
            confidence: 0.7,
        }],
        stress_rules: vec![StressRule {
            symbol: "AY".to_owned(),
            duration_scale: 1.1,
            intensity_boost: 1.1,
        }],
        head_style: HeadMovementStyle {
            nod_frequency: 0.5,
            tilt_tendency: 0.4,
            emphasis_style: EmphasisStyle::Moderate,
        },
    }
}

fn spanish() -> AccentProfile {
    AccentProfile {
        language: "es".to_owned(),
        region: "ES".to_owned(),
        // AH -> AA is unconditional: Spanish has no schwa.
        vowel_map: vowel_map(&[("AH", "AA"), ("IH", "IY"), ("UH", "UW")]),
        consonant_map: vowel_map(&[("V", "B"), ("Z", "S")]),
        rhythm: RhythmPattern {
            bpm: 132.0,
            stress_pattern: vec![1.1, 0.9],
            pause_durations: vec![160.0, 420.0],
        },
        context_rules: vec![
            ContextRule {
                from: "D".to_owned(),
                to: "DH".to_owned(),
                context: PhonemeContext::Vowel,
                probability: 0.7,
                confidence: 0.8,
            },
            ContextRule {
                from: "S".to_owned(),
                to: "Z".to_owned(),
                context: PhonemeContext::Final,
                probability: 0.4,
                confidence: 0.6,
            },
        ],
        stress_rules: vec![StressRule {
            symbol: "AA".to_owned(),
            duration_scale: 1.15,
            intensity_boost: 1.2,
        }],
        head_style: HeadMovementStyle {
            nod_frequency: 0.7,
            tilt_tendency: 0.6,
            emphasis_style: EmphasisStyle::Expressive,
        },
    }
}

fn french() -> AccentProfile {
    AccentProfile {
        language: "fr".to_owned(),
        region: "FR".to_owned(),
        vowel_map: vowel_map(&[("AE", "EH"), ("IH", "IY")]),
        consonant_map: vowel_map(&[("TH", "S"), ("DH", "Z")]),
        rhythm: RhythmPattern {
            bpm: 126.0,
            stress_pattern: vec![0.95, 1.0, 1.05],
            pause_durations: vec![180.0, 460.0],
        },
        context_rules: vec![ContextRule {
            from: "HH".to_owned(),
            to: "AH".to_owned(),
            context: PhonemeContext::Initial,
            probability: 0.5,
            confidence: 0.6,
        }],
        stress_rules: vec![StressRule {
            symbol: "EY".to_owned(),
            duration_scale: 1.1,
            intensity_boost: 1.05,
        }],
        head_style: HeadMovementStyle {
            nod_frequency: 0.4,
            tilt_tendency: 0.7,
            emphasis_style: EmphasisStyle::Subtle,
        },
    }
}

fn german() -> AccentProfile {
    AccentProfile {
        language: "de".to_owned(),
        region: "DE".to_owned(),
        vowel_map: vowel_map(&[("AE", "EH")]),
        consonant_map: vowel_map(&[("W", "V"), ("TH", "S"), ("DH", "Z")]),
        rhythm: RhythmPattern {
            bpm: 114.0,
            stress_pattern: vec![1.2, 0.8],
            pause_durations: vec![220.0, 540.0],
        },
        context_rules: vec![ContextRule {
            from: "D".to_owned(),
            to: "T".to_owned(),
            context: PhonemeContext::Final,
            probability: 0.8,
            confidence: 0.85,
        }],
        stress_rules: vec![StressRule {
            symbol: "AA".to_owned(),
            duration_scale: 1.2,
            intensity_boost: 1.15,
        }],
        head_style: HeadMovementStyle {
            nod_frequency: 0.6,
            tilt_tendency: 0.3,
            emphasis_style: EmphasisStyle::Moderate,
        },
    }
}

fn japanese() -> AccentProfile {
    AccentProfile {
        language: "ja".to_owned(),
        region: "JP".to_owned(),
        vowel_map: vowel_map(&[("AH", "AA"), ("IH", "IY"), ("UH", "UW"), ("EH", "EY")]),
        consonant_map: vowel_map(&[("L", "R"), ("TH", "S"), ("V", "B")]),
        rhythm: RhythmPattern {
            bpm: 138.0,
            stress_pattern: vec![1.0],
            pause_durations: vec![150.0, 400.0],
        },
        context_rules: vec![ContextRule {
            from: "S".to_owned(),
            to: "SH".to_owned(),
            context: PhonemeContext::Vowel,
            probability: 0.5,
            confidence: 0.7,
        }],
        stress_rules: Vec::new(),
        head_style: HeadMovementStyle {
            nod_frequency: 0.9,
            tilt_tendency: 0.4,
            emphasis_style: EmphasisStyle::Subtle,
        },
    }
}
