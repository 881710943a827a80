mod basic;

use crate::config::LanguageCode;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use basic::BasicTtsClient;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceId(pub String);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TtsRequest {
    pub text: String,
    pub language: LanguageCode,
    pub voice: Option<VoiceId>,
}

/// Returned once the engine has actually started producing audio; the core
/// only needs the start timestamp to anchor the lip-sync clock.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechStarted {
    pub start_timestamp_ms: f64,
    pub estimated_duration_ms: f64,
}

/// Engine-reported phoneme timing, when the backend can provide it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TtsPhoneme {
    pub symbol: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TtsTimings {
    pub phonemes: Vec<TtsPhoneme>,
    pub duration_ms: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("tts engine unavailable")]
    Unavailable,
    #[error("tts cannot synthesize empty text")]
    EmptyText,
    #[error("tts synthesis failed: {0}")]
    SynthesisFailed(String),
}

/// Opaque async speech backend. The core never touches audio itself.
pub trait TtsClient: Send + Sync {
    /// Start speaking; resolves when audio playback has begun.
    fn speak(&self, request: TtsRequest) -> BoxFuture<'_, Result<SpeechStarted, TtsError>>;

    /// Synthesize phoneme timings without playing audio, for lip-sync
    /// cross-validation.
    fn synthesize_for_lip_sync(
        &self,
        request: TtsRequest,
    ) -> BoxFuture<'_, Result<TtsTimings, TtsError>>;
}
