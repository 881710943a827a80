use crate::accent::AccentAdapter;
use crate::config::LanguageCode;
use crate::phoneme::{build_timeline, PhonemeTimeline, PhonemeUnit, Viseme};
use crate::tts::{TtsClient, TtsRequest, TtsTimings};

const LOG_TARGET: &str = "lipsync::fallback";

/// Confidence assigned to engine-reported phonemes; the engine gives us
/// timings but no per-phoneme certainty.
const TTS_PHONEME_CONFIDENCE: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LipSyncLayer {
    /// Locally built timeline with accent adaptation applied.
    PreciseAccent,
    /// Timeline converted from TTS-reported phoneme timings, no accent pass.
    SimpleTts,
    /// No visual sync; audio plays on its own.
    AudioOnly,
}

#[derive(Clone, Debug)]
pub struct LipSyncPlan {
    pub layer: LipSyncLayer,
    pub timeline: Option<PhonemeTimeline>,
    pub rate_multiplier: f32,
    pub quality: f32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    #[error("no text to speak")]
    NoText,
}

/// Layered lip-sync preparation: precise accent-aware synthesis first,
/// TTS-driven simple visemes second, audio-only last. Each layer's failure
/// is logged and degrades to the next; only missing text is fatal.
pub struct LipSyncPipeline<T: TtsClient> {
    tts: T,
    adapter: AccentAdapter,
    precise_enabled: bool,
    last_layer: Option<LipSyncLayer>,
}

impl<T: TtsClient> LipSyncPipeline<T> {
    pub fn new(tts: T, adapter: AccentAdapter) -> Self {
        Self {
            tts,
            adapter,
            precise_enabled: true,
            last_layer: None,
        }
    }

    /// Marks the precise engine unavailable; preparation starts at the
    /// TTS-driven layer until re-enabled.
    pub fn set_precise_enabled(&mut self, enabled: bool) {
        self.precise_enabled = enabled;
    }

    /// Layer chosen by the most recent `prepare` call.
    pub fn active_layer(&self) -> Option<LipSyncLayer> {
        self.last_layer
    }

    pub async fn prepare(
        &mut self,
        text: &str,
        language: &LanguageCode,
    ) -> Result<LipSyncPlan, PrepareError> {
        if text.trim().is_empty() {
            return Err(PrepareError::NoText);
        }

        if self.precise_enabled {
            match build_timeline(text, language) {
                Ok(timeline) => {
                    let adapted = self.adapter.adapt(&timeline, language);
                    let plan = LipSyncPlan {
                        layer: LipSyncLayer::PreciseAccent,
                        timeline: Some(adapted.timeline),
                        rate_multiplier: adapted.rate_multiplier,
                        quality: adapted.quality,
                    };
                    self.last_layer = Some(plan.layer);
                    return Ok(plan);
                }
                Err(e) => {
                    tracing::warn!(
                        target: LOG_TARGET,
                        error = %e,
                        "precise lip sync failed, falling back to TTS-driven visemes"
                    );
                }
            }
        }

        match self
            .tts
            .synthesize_for_lip_sync(TtsRequest {
                text: text.to_owned(),
                language: language.clone(),
                voice: None,
            })
            .await
        {
            Ok(timings) if !timings.phonemes.is_empty() => {
                let timeline = timeline_from_tts(timings, language);
                let plan = LipSyncPlan {
                    layer: LipSyncLayer::SimpleTts,
                    timeline: Some(timeline),
                    rate_multiplier: 1.0,
                    quality: TTS_PHONEME_CONFIDENCE,
                };
                self.last_layer = Some(plan.layer);
                Ok(plan)
            }
            Ok(_) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    "TTS returned no phoneme timings, falling back to audio-only"
                );
                self.audio_only()
            }
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    error = %e,
                    "TTS lip sync failed, falling back to audio-only"
                );
                self.audio_only()
            }
        }
    }

    fn audio_only(&mut self) -> Result<LipSyncPlan, PrepareError> {
        self.last_layer = Some(LipSyncLayer::AudioOnly);
        Ok(LipSyncPlan {
            layer: LipSyncLayer::AudioOnly,
            timeline: None,
            rate_multiplier: 1.0,
            quality: 0.0,
        })
    }
}

/// Convert engine timings into a timeline, dropping out-of-order entries so
/// the scheduler's monotonicity invariant holds.
fn timeline_from_tts(timings: TtsTimings, language: &LanguageCode) -> PhonemeTimeline {
    let mut units: Vec<PhonemeUnit> = Vec::with_capacity(timings.phonemes.len());
    let mut cursor = 0.0_f64;
    for p in timings.phonemes {
        if p.end_ms < p.start_ms || p.start_ms < cursor {
            continue;
        }
        cursor = p.end_ms;
        units.push(PhonemeUnit {
            viseme: Viseme::from_symbol(&p.symbol),
            symbol: p.symbol,
            start_ms: p.start_ms,
            end_ms: p.end_ms,
            confidence: TTS_PHONEME_CONFIDENCE,
        });
    }
    let total_duration_ms = timings.duration_ms.max(cursor);
    PhonemeTimeline {
        language: language.as_str().to_owned(),
        units,
        words: Vec::new(),
        total_duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accent::AccentProfileStore;
    use crate::tts::{SpeechStarted, TtsError, TtsPhoneme};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Arc;

    #[derive(Clone)]
    struct ScriptedTts;

    impl TtsClient for ScriptedTts {
        fn speak(&self, _request: TtsRequest) -> BoxFuture<'_, Result<SpeechStarted, TtsError>> {
            async {
                Ok(SpeechStarted {
                    start_timestamp_ms: 0.0,
                    estimated_duration_ms: 300.0,
                })
            }
            .boxed()
        }

        fn synthesize_for_lip_sync(
            &self,
            _request: TtsRequest,
        ) -> BoxFuture<'_, Result<TtsTimings, TtsError>> {
            async {
                Ok(TtsTimings {
                    phonemes: vec![
                        TtsPhoneme {
                            symbol: "HH".into(),
                            start_ms: 0.0,
                            end_ms: 50.0,
                        },
                        TtsPhoneme {
                            symbol: "AY".into(),
                            start_ms: 50.0,
                            end_ms: 190.0,
                        },
                        // Out of order: must be dropped during conversion.
                        TtsPhoneme {
                            symbol: "S".into(),
                            start_ms: 100.0,
                            end_ms: 160.0,
                        },
                    ],
                    duration_ms: 300.0,
                })
            }
            .boxed()
        }
    }

    #[derive(Clone)]
    struct FailingTts;

    impl TtsClient for FailingTts {
        fn speak(&self, _request: TtsRequest) -> BoxFuture<'_, Result<SpeechStarted, TtsError>> {
            async { Err(TtsError::Unavailable) }.boxed()
        }

        fn synthesize_for_lip_sync(
            &self,
            _request: TtsRequest,
        ) -> BoxFuture<'_, Result<TtsTimings, TtsError>> {
            async { Err(TtsError::SynthesisFailed("engine crashed".into())) }.boxed()
        }
    }

    fn pipeline<T: TtsClient>(tts: T) -> LipSyncPipeline<T> {
        let adapter = AccentAdapter::with_seed(Arc::new(AccentProfileStore::builtin()), 1);
        LipSyncPipeline::new(tts, adapter)
    }

    fn en() -> LanguageCode {
        LanguageCode::new("en-US").expect("valid")
    }

    #[tokio::test]
    async fn precise_layer_wins_for_normal_text() {
        let mut p = pipeline(ScriptedTts);
        let plan = p.prepare("Hello world.", &en()).await.expect("plan");
        assert_eq!(plan.layer, LipSyncLayer::PreciseAccent);
        assert!(plan.timeline.is_some());
        assert_eq!(p.active_layer(), Some(LipSyncLayer::PreciseAccent));
    }

    #[tokio::test]
    async fn unavailable_precise_engine_uses_tts_timings() {
        let mut p = pipeline(ScriptedTts);
        p.set_precise_enabled(false);
        let plan = p.prepare("Hello world.", &en()).await.expect("plan");
        assert_eq!(plan.layer, LipSyncLayer::SimpleTts);

        let timeline = plan.timeline.expect("timeline");
        assert!(timeline.is_well_formed());
        // The out-of-order phoneme was dropped.
        assert_eq!(timeline.units.len(), 2);
        assert_eq!(timeline.total_duration_ms, 300.0);
    }

    #[tokio::test]
    async fn double_failure_degrades_to_audio_only() {
        let mut p = pipeline(FailingTts);
        p.set_precise_enabled(false);
        let plan = p.prepare("Hello world.", &en()).await.expect("plan");
        assert_eq!(plan.layer, LipSyncLayer::AudioOnly);
        assert!(plan.timeline.is_none());
        assert_eq!(p.active_layer(), Some(LipSyncLayer::AudioOnly));
    }

    #[tokio::test]
    async fn unpronounceable_text_falls_through_to_tts() {
        // Digits have no grapheme rules, so the precise layer produces no
        // words and the chain moves on.
        let mut p = pipeline(ScriptedTts);
        let plan = p.prepare("42", &en()).await.expect("plan");
        assert_eq!(plan.layer, LipSyncLayer::SimpleTts);
    }

    #[tokio::test]
    async fn empty_text_is_the_terminal_error() {
        let mut p = pipeline(ScriptedTts);
        let result = p.prepare("   ", &en()).await;
        assert!(matches!(result, Err(PrepareError::NoText)));
    }
}
