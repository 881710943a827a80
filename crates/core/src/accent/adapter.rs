use crate::accent::AccentProfileStore;
use crate::config::LanguageCode;
use crate::phoneme::{PhonemeTimeline, PhonemeUnit, Viseme};
use crate::util::clamp01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOG_TARGET: &str = "accent::adapter";

/// Vowels at or above this duration count as stressed for rule contexts.
const STRESSED_VOWEL_MS: f64 = 115.0;

/// Neighborhood condition under which a contextual rule may fire.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PhonemeContext {
    /// A neighboring unit is a vowel.
    Vowel,
    /// The following unit is a consonant.
    Consonant,
    /// Word-initial: preceded by silence or nothing.
    Initial,
    /// Word-final: followed by silence or nothing.
    Final,
    Stressed,
    Unstressed,
}

/// Result of applying an accent profile to a timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct AccentAdaptation {
    pub timeline: PhonemeTimeline,
    pub rate_multiplier: f32,
    /// Weighted combination of transformation coverage, rule confidence and
    /// duration preservation.
    pub quality: f32,
    pub transformed_units: usize,
}

/// Applies pronunciation, stress and rhythm rules from an accent profile.
///
/// The contextual pass is probability-gated; the RNG is injected so callers
/// can seed it for reproducible output.
pub struct AccentAdapter {
    store: Arc<AccentProfileStore>,
    rng: StdRng,
}

impl AccentAdapter {
    pub fn new(store: Arc<AccentProfileStore>) -> Self {
        Self {
            store,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(store: Arc<AccentProfileStore>, seed: u64) -> Self {
        Self {
            store,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Adapt a timeline for `language`. Unknown languages return the input
    /// unchanged with a neutral multiplier.
    pub fn adapt(&mut self, timeline: &PhonemeTimeline, language: &LanguageCode) -> AccentAdaptation {
        let Some(profile) = self.store.get(language) else {
            tracing::debug!(
                target: LOG_TARGET,
                language = %language,
                "no accent profile; passing timeline through"
            );
            return AccentAdaptation {
                timeline: timeline.clone(),
                rate_multiplier: 1.0,
                quality: 1.0,
                transformed_units: 0,
            };
        };

        let original_duration = timeline.total_duration_ms;
        let mut units = timeline.units.clone();
        let mut transformed = 0usize;
        let mut rule_confidences: Vec<f32> = Vec::new();

        // Pass 1: unconditional vowel/consonant substitution. Strictly 1:1.
        for unit in units.iter_mut() {
            if unit.is_silence() {
                continue;
            }
            let map = if unit.is_vowel() {
                &profile.vowel_map
            } else {
                &profile.consonant_map
            };
            if let Some(replacement) = map.get(&unit.symbol) {
                unit.symbol = replacement.clone();
                unit.viseme = Viseme::from_symbol(replacement);
                transformed += 1;
            }
        }

        // Pass 2: probability-gated contextual rules.
        for rule in &profile.context_rules {
            for idx in 0..units.len() {
                if units[idx].symbol != rule.from || units[idx].is_silence() {
                    continue;
                }
                if !context_matches(&units, idx, rule.context) {
                    continue;
                }
                if self.rng.random::<f32>() >= rule.probability {
                    continue;
                }
                units[idx].symbol = rule.to.clone();
                units[idx].viseme = Viseme::from_symbol(&rule.to);
                transformed += 1;
                rule_confidences.push(rule.confidence);
            }
        }

        // Pass 3: stress-rule duration/intensity rescale.
        for unit in units.iter_mut() {
            for rule in &profile.stress_rules {
                if unit.symbol == rule.symbol {
                    let d = unit.duration_ms() * rule.duration_scale as f64;
                    unit.end_ms = unit.start_ms + d;
                    unit.confidence = clamp01(unit.confidence * rule.intensity_boost);
                }
            }
        }

        // Pass 4: global rhythm rescale, then retime so units stay contiguous.
        let rate = profile.rhythm.speech_rate_multiplier();
        let pause = profile.rhythm.pause_multiplier();
        let stress = profile.rhythm.syllable_stress_ratio();
        let start_offset = units.first().map(|u| u.start_ms).unwrap_or(0.0);
        let mut cursor = start_offset;
        for unit in units.iter_mut() {
            let mut d = unit.duration_ms() * rate as f64;
            if unit.is_silence() {
                d *= pause;
            } else if unit.is_vowel() {
                d *= stress as f64;
            }
            unit.start_ms = cursor;
            unit.end_ms = cursor + d;
            cursor = unit.end_ms;
        }
        let total_duration_ms = cursor - start_offset;

        // Re-derive word spans from the retimed units.
        let words = timeline
            .words
            .iter()
            .map(|span| {
                let mut span = span.clone();
                if let (Some(first), Some(last)) = (
                    units.get(span.unit_range.start),
                    span.unit_range.end.checked_sub(1).and_then(|i| units.get(i)),
                ) {
                    span.start_ms = first.start_ms;
                    span.end_ms = last.end_ms;
                }
                span
            })
            .collect();

        let fraction = if units.is_empty() {
            0.0
        } else {
            transformed as f32 / units.len() as f32
        };
        let mean_confidence = if rule_confidences.is_empty() {
            1.0
        } else {
            rule_confidences.iter().sum::<f32>() / rule_confidences.len() as f32
        };
        let duration_ratio = if original_duration > 0.0 && total_duration_ms > 0.0 {
            let (lo, hi) = if total_duration_ms < original_duration {
                (total_duration_ms, original_duration)
            } else {
                (original_duration, total_duration_ms)
            };
            (lo / hi) as f32
        } else {
            1.0
        };
        let quality = clamp01(0.25 * fraction + 0.35 * mean_confidence + 0.4 * duration_ratio);

        tracing::debug!(
            target: LOG_TARGET,
            language = %language,
            transformed,
            rate,
            quality,
            "accent adaptation applied"
        );

        AccentAdaptation {
            timeline: PhonemeTimeline {
                language: timeline.language.clone(),
                units,
                words,
                total_duration_ms,
            },
            rate_multiplier: rate,
            quality,
            transformed_units: transformed,
        }
    }
}

fn context_matches(units: &[PhonemeUnit], idx: usize, context: PhonemeContext) -> bool {
    let unit = &units[idx];
    let prev = idx.checked_sub(1).map(|i| &units[i]);
    let next = units.get(idx + 1);
    match context {
        PhonemeContext::Initial => prev.is_none_or(|p| p.is_silence()),
        PhonemeContext::Final => next.is_none_or(|n| n.is_silence()),
        PhonemeContext::Vowel => {
            prev.is_some_and(|p| p.is_vowel()) || next.is_some_and(|n| n.is_vowel())
        }
        PhonemeContext::Consonant => {
            next.is_some_and(|n| !n.is_vowel() && !n.is_silence())
        }
        PhonemeContext::Stressed => unit.is_vowel() && unit.duration_ms() >= STRESSED_VOWEL_MS,
        PhonemeContext::Unstressed => unit.is_vowel() && unit.duration_ms() < STRESSED_VOWEL_MS,
    }
}
