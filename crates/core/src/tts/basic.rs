use crate::phoneme::{base_duration_ms, lookup_word, phonemes_for_grapheme};
use crate::tts::{SpeechStarted, TtsClient, TtsError, TtsPhoneme, TtsRequest, TtsTimings};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Fabricated-timing TTS stand-in.
///
/// Produces plausible phoneme timings from text alone so the rest of the
/// pipeline can run without a real speech backend. Timing quality is rough
/// by design.
#[derive(Clone)]
pub struct BasicTtsClient;

impl BasicTtsClient {
    pub fn new() -> Self {
        Self
    }

    fn fabricate(text: &str) -> TtsTimings {
        let mut phonemes = Vec::new();
        let mut cursor = 0.0_f64;
        for word in text.split_whitespace() {
            let cleaned: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if cleaned.is_empty() {
                continue;
            }
            if let Some(entry) = lookup_word(&cleaned) {
                for symbol in entry {
                    let d = base_duration_ms(symbol);
                    phonemes.push(TtsPhoneme {
                        symbol: (*symbol).to_owned(),
                        start_ms: cursor,
                        end_ms: cursor + d,
                    });
                    cursor += d;
                }
            } else {
                for ch in cleaned.chars() {
                    if let Some(symbol) = phonemes_for_grapheme(ch) {
                        let d = base_duration_ms(symbol);
                        phonemes.push(TtsPhoneme {
                            symbol: symbol.to_owned(),
                            start_ms: cursor,
                            end_ms: cursor + d,
                        });
                        cursor += d;
                    }
                }
            }
            cursor += 120.0; // word gap
        }
        TtsTimings {
            phonemes,
            duration_ms: cursor,
        }
    }
}

impl Default for BasicTtsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TtsClient for BasicTtsClient {
    fn speak(&self, request: TtsRequest) -> BoxFuture<'_, Result<SpeechStarted, TtsError>> {
        async move {
            if request.text.trim().is_empty() {
                return Err(TtsError::EmptyText);
            }
            let timings = Self::fabricate(&request.text);
            Ok(SpeechStarted {
                start_timestamp_ms: 0.0,
                estimated_duration_ms: timings.duration_ms,
            })
        }
        .boxed()
    }

    fn synthesize_for_lip_sync(
        &self,
        request: TtsRequest,
    ) -> BoxFuture<'_, Result<TtsTimings, TtsError>> {
        async move {
            if request.text.trim().is_empty() {
                return Err(TtsError::EmptyText);
            }
            Ok(Self::fabricate(&request.text))
        }
        .boxed()
    }
}
