mod builder;
mod dictionary;

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub use builder::{build_timeline, TimelineError};
pub use dictionary::{base_duration_ms, lookup_word, phonemes_for_grapheme};

pub const SILENCE_SYMBOL: &str = "SIL";

/// Visual mouth-shape category. One viseme covers several phonemes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Viseme {
    #[default]
    Silence,
    /// p, b, m — lips pressed
    PP,
    /// f, v — lower lip to teeth
    FF,
    /// th, dh — tongue between teeth
    TH,
    /// t, d — tongue to ridge
    DD,
    /// k, g — back of tongue
    KK,
    /// ch, jh, sh, zh
    CH,
    /// s, z
    SS,
    /// n, ng, l
    NN,
    /// r
    RR,
    /// open central vowels
    AA,
    E,
    I,
    O,
    U,
}

impl Viseme {
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            SILENCE_SYMBOL => Viseme::Silence,
            "P" | "B" | "M" => Viseme::PP,
            "F" | "V" => Viseme::FF,
            "TH" | "DH" => Viseme::TH,
            "T" | "D" => Viseme::DD,
            "K" | "G" | "HH" => Viseme::KK,
            "CH" | "JH" | "SH" | "ZH" => Viseme::CH,
            "S" | "Z" => Viseme::SS,
            "N" | "NG" | "L" => Viseme::NN,
            "R" | "ER" => Viseme::RR,
            "AA" | "AH" | "AY" | "AW" => Viseme::AA,
            "AE" | "EH" | "EY" => Viseme::E,
            "IH" | "IY" | "Y" => Viseme::I,
            "AO" | "OW" | "OY" => Viseme::O,
            "UH" | "UW" | "W" => Viseme::U,
            _ => Viseme::Silence,
        }
    }
}

/// True for vowel symbols (ARPAbet vowels all start with a vowel letter).
pub fn is_vowel_symbol(symbol: &str) -> bool {
    symbol != SILENCE_SYMBOL
        && matches!(symbol.as_bytes().first(), Some(b'A' | b'E' | b'I' | b'O' | b'U'))
}

/// One timed speech sound. Immutable once handed to the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhonemeUnit {
    pub symbol: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub confidence: f32,
    pub viseme: Viseme,
}

impl PhonemeUnit {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    pub fn is_silence(&self) -> bool {
        self.symbol == SILENCE_SYMBOL
    }

    pub fn is_vowel(&self) -> bool {
        is_vowel_symbol(&self.symbol)
    }
}

/// Word-level index entry over the flat unit sequence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WordSpan {
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub unit_range: Range<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PhonemeTimeline {
    pub language: String,
    pub units: Vec<PhonemeUnit>,
    pub words: Vec<WordSpan>,
    pub total_duration_ms: f64,
}

impl PhonemeTimeline {
    /// Units must be time-ordered, non-overlapping, with non-negative
    /// durations.
    pub fn is_well_formed(&self) -> bool {
        let mut cursor = 0.0_f64;
        for unit in &self.units {
            if unit.end_ms < unit.start_ms || unit.start_ms < cursor {
                return false;
            }
            cursor = unit.end_ms;
        }
        true
    }

    /// Unit whose [start, end) interval contains `at_ms`, if any.
    pub fn unit_at(&self, at_ms: f64) -> Option<&PhonemeUnit> {
        self.units
            .iter()
            .find(|u| at_ms >= u.start_ms && at_ms < u.end_ms)
    }
}
