//! Lexical language detection with change events.
//!
//! Scores text against per-language signature fragments and common-word
//! lists. Deliberately lightweight: the goal is picking an accent profile,
//! not linguistic identification.

use crate::config::LanguageCode;
use crate::events::{EventBus, SubscriptionId};
use crate::util::{text_hash, FifoCache};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "language";

/// Below this many characters there is not enough signal to re-detect.
const MIN_TEXT_CHARS: usize = 10;
/// Confidence required before a change event fires.
const CHANGE_CONFIDENCE: f32 = 0.7;
const CONFIDENCE_CAP: f32 = 0.95;
const CACHE_CAPACITY: usize = 1_000;
const HASH_PREFIX_CHARS: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    pub language: LanguageCode,
    pub confidence: f32,
}

/// Pushed to listeners when `process_text` sees a confident language switch.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LanguageChangeEvent {
    pub previous_language: LanguageCode,
    pub new_language: LanguageCode,
    pub confidence: f32,
    pub timestamp_ms: f64,
    pub text_sample: String,
}

struct Signature {
    language: &'static str,
    /// Substring fragments characteristic of the language (diacritics,
    /// punctuation, frequent letter groups).
    patterns: &'static [&'static str],
    common_words: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        language: "en",
        patterns: &["th", "ing", "tion", "'s"],
        common_words: &[
            "the", "is", "are", "you", "and", "what", "how", "hello", "thanks", "please",
        ],
    },
    Signature {
        language: "es",
        patterns: &["¿", "¡", "ñ", "á", "é", "í", "ó", "ú", "ción"],
        common_words: &[
            "hola", "cómo", "como", "estás", "qué", "gracias", "por", "favor", "buenos", "días",
            "sí", "usted",
        ],
    },
    Signature {
        language: "fr",
        patterns: &["è", "ê", "ç", "œ", "qu'", "tion"],
        common_words: &[
            "bonjour", "merci", "comment", "vous", "est", "les", "une", "avec", "oui", "ça",
        ],
    },
    Signature {
        language: "de",
        patterns: &["ä", "ö", "ü", "ß", "sch", "ich"],
        common_words: &[
            "hallo", "danke", "bitte", "wie", "und", "das", "ist", "nicht", "guten", "sie",
        ],
    },
    Signature {
        language: "ja",
        patterns: &["の", "は", "を", "です", "ます", "か"],
        common_words: &["こんにちは", "ありがとう", "はい", "いいえ", "お願いします"],
    },
];

/// Scores input text against the built-in signatures, caches results, and
/// raises change events through a typed bus.
pub struct LanguageDetector {
    current: LanguageCode,
    cache: FifoCache<u64, DetectionResult>,
    bus: EventBus<LanguageChangeEvent>,
}

impl LanguageDetector {
    pub fn new(initial: LanguageCode) -> Self {
        Self {
            current: initial,
            cache: FifoCache::new(CACHE_CAPACITY),
            bus: EventBus::new(),
        }
    }

    pub fn current_language(&self) -> &LanguageCode {
        &self.current
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&LanguageChangeEvent) + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Detect the language of `text`. Short inputs short-circuit to the
    /// current language at 0.5 confidence and are never cached.
    pub fn detect_language(&mut self, text: &str) -> DetectionResult {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_TEXT_CHARS {
            return DetectionResult {
                language: self.current.clone(),
                confidence: 0.5,
            };
        }

        let key = text_hash(trimmed, HASH_PREFIX_CHARS);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let result = self.score(trimmed);
        self.cache.insert(key, result.clone());
        result
    }

    /// Detect and, on a confident language switch, emit a change event
    /// before updating the current language.
    pub fn process_text(&mut self, text: &str, now_ms: f64) -> DetectionResult {
        let result = self.detect_language(text);
        if result.confidence > CHANGE_CONFIDENCE && result.language != self.current {
            let event = LanguageChangeEvent {
                previous_language: self.current.clone(),
                new_language: result.language.clone(),
                confidence: result.confidence,
                timestamp_ms: now_ms,
                text_sample: text.chars().take(HASH_PREFIX_CHARS).collect(),
            };
            tracing::info!(
                target: LOG_TARGET,
                from = %event.previous_language,
                to = %event.new_language,
                confidence = event.confidence,
                "language change detected"
            );
            self.bus.emit(&event);
            self.current = result.language.clone();
        }
        result
    }

    fn score(&self, text: &str) -> DetectionResult {
        let lower = text.to_lowercase();
        let words: Vec<String> = lower
            .split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
            })
            .filter(|w| !w.is_empty())
            .collect();
        let word_count = words.len().max(1);

        let mut best: Option<(&'static str, u32)> = None;
        for signature in SIGNATURES {
            let pattern_hits = signature
                .patterns
                .iter()
                .filter(|p| lower.contains(**p))
                .count() as u32;
            let word_hits = words
                .iter()
                .filter(|w| signature.common_words.contains(&w.as_str()))
                .count() as u32;
            let score = pattern_hits + word_hits * 2;

            let better = match best {
                None => score > 0,
                // Strictly greater: ties keep the earlier winner, and the
                // current language wins a tie below.
                Some((_, best_score)) => {
                    score > best_score
                        || (score == best_score && signature.language == self.current.primary())
                }
            };
            if better {
                best = Some((signature.language, score));
            }
        }

        match best {
            Some((language, score)) if score > 0 => {
                let confidence =
                    (score as f32 / (word_count as f32 * 0.5)).min(CONFIDENCE_CAP);
                let language = LanguageCode::new(language)
                    .unwrap_or_else(|_| self.current.clone());
                DetectionResult {
                    language,
                    confidence,
                }
            }
            _ => DetectionResult {
                language: self.current.clone(),
                confidence: 0.0,
            },
        }
    }
}
