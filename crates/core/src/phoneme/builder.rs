use crate::config::LanguageCode;
use crate::phoneme::{
    base_duration_ms, dictionary, lookup_word, PhonemeTimeline, PhonemeUnit, Viseme, WordSpan,
    SILENCE_SYMBOL,
};

const LOG_TARGET: &str = "phoneme::builder";

pub const EDGE_SILENCE_MS: f64 = 100.0;
pub const WORD_PAUSE_MS: f64 = 200.0;
pub const SENTENCE_PAUSE_MS: f64 = 500.0;

const DICTIONARY_CONFIDENCE: f32 = 0.95;
const FALLBACK_CONFIDENCE: f32 = 0.6;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("no speakable text after normalization")]
    EmptyText,
}

/// Convert text into a timed phoneme sequence plus a word index.
///
/// Deterministic: identical (text, language) always yields an identical
/// timeline.
pub fn build_timeline(
    text: &str,
    language: &LanguageCode,
) -> Result<PhonemeTimeline, TimelineError> {
    let normalized = normalize_text(text);
    let sentences = split_sentences(&normalized);
    if sentences.is_empty() {
        return Err(TimelineError::EmptyText);
    }

    let mut units = Vec::new();
    let mut words = Vec::new();
    let mut cursor = 0.0_f64;

    push_silence(&mut units, &mut cursor, EDGE_SILENCE_MS);

    for (si, sentence) in sentences.iter().enumerate() {
        let sentence_words: Vec<&str> = sentence.split_whitespace().collect();
        for (wi, raw_word) in sentence_words.iter().enumerate() {
            let word = clean_word(raw_word);
            if word.is_empty() {
                continue;
            }

            let word_start = cursor;
            let unit_start = units.len();
            for (symbol, confidence) in word_phonemes(&word) {
                let duration = base_duration_ms(symbol);
                units.push(PhonemeUnit {
                    symbol: symbol.to_owned(),
                    start_ms: cursor,
                    end_ms: cursor + duration,
                    confidence,
                    viseme: Viseme::from_symbol(symbol),
                });
                cursor += duration;
            }

            if units.len() > unit_start {
                words.push(WordSpan {
                    word,
                    start_ms: word_start,
                    end_ms: cursor,
                    unit_range: unit_start..units.len(),
                });
            }

            if wi + 1 < sentence_words.len() {
                push_silence(&mut units, &mut cursor, WORD_PAUSE_MS);
            }
        }

        if si + 1 < sentences.len() {
            push_silence(&mut units, &mut cursor, SENTENCE_PAUSE_MS);
        }
    }

    if words.is_empty() {
        return Err(TimelineError::EmptyText);
    }

    push_silence(&mut units, &mut cursor, EDGE_SILENCE_MS);

    tracing::debug!(
        target: LOG_TARGET,
        language = %language,
        units = units.len(),
        words = words.len(),
        duration_ms = cursor,
        "timeline built"
    );

    Ok(PhonemeTimeline {
        language: language.as_str().to_owned(),
        units,
        words,
        total_duration_ms: cursor,
    })
}

fn push_silence(units: &mut Vec<PhonemeUnit>, cursor: &mut f64, duration_ms: f64) {
    units.push(PhonemeUnit {
        symbol: SILENCE_SYMBOL.to_owned(),
        start_ms: *cursor,
        end_ms: *cursor + duration_ms,
        confidence: 1.0,
        viseme: Viseme::Silence,
    });
    *cursor += duration_ms;
}

/// Strip markup tags, normalize curly quotes and whitespace.
fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            c if c.is_whitespace() => out.push(' '),
            c => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn clean_word(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .collect::<String>()
        .to_lowercase()
}

/// Phonemes for one cleaned word: dictionary hit or grapheme fallback.
fn word_phonemes(word: &str) -> Vec<(&'static str, f32)> {
    if let Some(entry) = lookup_word(word) {
        return entry
            .iter()
            .map(|s| (*s, DICTIONARY_CONFIDENCE))
            .collect();
    }

    let chars: Vec<char> = word.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect::<String>().to_lowercase();
            if let Some(symbol) = dictionary::phonemes_for_digraph(&pair) {
                out.push((symbol, FALLBACK_CONFIDENCE));
                i += 2;
                continue;
            }
        }
        if let Some(symbol) = dictionary::phonemes_for_grapheme(chars[i]) {
            out.push((symbol, FALLBACK_CONFIDENCE));
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LanguageCode {
        LanguageCode::new("en-US").expect("valid")
    }

    #[test]
    fn hello_world_matches_documented_layout() {
        let timeline = build_timeline("Hello world.", &en()).expect("timeline");
        assert!(timeline.is_well_formed());

        let symbols: Vec<&str> = timeline.units.iter().map(|u| u.symbol.as_str()).collect();
        // SIL + dictionary "hello" + word pause + grapheme "world" + SIL
        assert_eq!(
            symbols,
            vec!["SIL", "HH", "AH", "L", "OW", "SIL", "W", "OW", "R", "L", "D", "SIL"]
        );

        let first = &timeline.units[0];
        assert!(first.is_silence());
        assert_eq!(first.duration_ms(), EDGE_SILENCE_MS);

        // Inter-word pause sits between the two words.
        let pause = &timeline.units[5];
        assert!(pause.is_silence());
        assert_eq!(pause.duration_ms(), WORD_PAUSE_MS);

        // Dictionary phonemes carry their documented base durations.
        assert_eq!(timeline.units[1].duration_ms(), base_duration_ms("HH"));
        assert_eq!(timeline.units[2].duration_ms(), base_duration_ms("AH"));

        let total: f64 = timeline.units.iter().map(|u| u.duration_ms()).sum();
        assert_eq!(timeline.total_duration_ms, total);
    }

    #[test]
    fn timeline_is_deterministic() {
        let a = build_timeline("What time is it?", &en()).expect("timeline");
        let b = build_timeline("What time is it?", &en()).expect("timeline");
        assert_eq!(a, b);
    }

    #[test]
    fn sentence_pause_inserted_between_sentences() {
        let timeline = build_timeline("Yes. No.", &en()).expect("timeline");
        let pause = timeline
            .units
            .iter()
            .find(|u| u.is_silence() && u.duration_ms() == SENTENCE_PAUSE_MS);
        assert!(pause.is_some());
    }

    #[test]
    fn timeline_is_contiguous_and_monotonic() {
        let timeline =
            build_timeline("The quick brown fox jumps! Does it though?", &en()).expect("timeline");
        assert!(timeline.is_well_formed());
        for pair in timeline.units.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
            assert!(pair[0].duration_ms() >= 0.0);
        }
    }

    #[test]
    fn markup_and_fancy_quotes_are_normalized() {
        let timeline =
            build_timeline("<speak>\u{201C}Hello\u{201D} <b>you</b></speak>", &en())
                .expect("timeline");
        assert_eq!(timeline.words.len(), 2);
        assert_eq!(timeline.words[0].word, "hello");
        assert_eq!(timeline.words[1].word, "you");
    }

    #[test]
    fn empty_text_is_an_error() {
        assert_eq!(build_timeline("   ", &en()), Err(TimelineError::EmptyText));
        assert_eq!(
            build_timeline("?!.", &en()),
            Err(TimelineError::EmptyText)
        );
    }

    #[test]
    fn word_index_spans_cover_their_units() {
        let timeline = build_timeline("Thank you", &en()).expect("timeline");
        assert_eq!(timeline.words.len(), 2);
        let span = &timeline.words[0];
        assert_eq!(span.word, "thank");
        for unit in &timeline.units[span.unit_range.clone()] {
            assert!(unit.start_ms >= span.start_ms && unit.end_ms <= span.end_ms);
        }
    }
}
