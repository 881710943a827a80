use crate::config::SyncOffset;
use crate::lipsync::{
    morph, DefaultMorphResolver, MorphTargetResolver, MorphWeightMap, MouthShape,
};
use crate::phoneme::{PhonemeTimeline, Viseme};
use crate::util::clamp01;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "lipsync::scheduler";

/// Vowels get a visibility boost so open mouth shapes read clearly.
const VOWEL_INTENSITY_BOOST: f32 = 1.2;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Per-frame scheduler output handed to the frame callback.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameState {
    pub playback: PlaybackState,
    pub viseme: Viseme,
    pub shape: MouthShape,
    pub intensity: f32,
    pub elapsed_ms: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LipSyncError {
    #[error("no phoneme timeline loaded")]
    NoTimeline,
}

type FrameCallback = Box<dyn FnMut(&FrameState, &MorphWeightMap) + Send>;

/// Real-time phoneme timeline player.
///
/// Frame-driven: the host's animation callback supplies `now_ms` and the
/// scheduler never reads a clock itself. The scheduler does no audio I/O;
/// callers start audio separately and the configured sync offset absorbs the
/// TTS startup gap.
pub struct LipSyncScheduler {
    timeline: Option<PhonemeTimeline>,
    state: PlaybackState,
    /// Wall-clock instant corresponding to timeline t = 0 while playing.
    anchor_ms: f64,
    /// Elapsed position captured at pause time.
    paused_elapsed_ms: f64,
    sync_offset: SyncOffset,
    resolver: Box<dyn MorphTargetResolver>,
    on_frame: Option<FrameCallback>,
}

impl LipSyncScheduler {
    pub fn new(sync_offset: SyncOffset) -> Self {
        Self::with_resolver(sync_offset, Box::new(DefaultMorphResolver))
    }

    pub fn with_resolver(sync_offset: SyncOffset, resolver: Box<dyn MorphTargetResolver>) -> Self {
        Self {
            timeline: None,
            state: PlaybackState::Idle,
            anchor_ms: 0.0,
            paused_elapsed_ms: 0.0,
            sync_offset,
            resolver,
            on_frame: None,
        }
    }

    /// Load a timeline and reset to Idle. A new timeline replaces the old
    /// one wholesale.
    pub fn initialize(&mut self, timeline: PhonemeTimeline) {
        tracing::debug!(
            target: LOG_TARGET,
            units = timeline.units.len(),
            duration_ms = timeline.total_duration_ms,
            "timeline loaded"
        );
        self.timeline = Some(timeline);
        self.state = PlaybackState::Idle;
        self.paused_elapsed_ms = 0.0;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Begin playback, anchoring the timeline to `now_ms`. Callers are
    /// responsible for starting audio as close to this call as possible.
    pub fn start<F>(&mut self, now_ms: f64, on_frame: F) -> Result<(), LipSyncError>
    where
        F: FnMut(&FrameState, &MorphWeightMap) + Send + 'static,
    {
        if self.timeline.is_none() {
            return Err(LipSyncError::NoTimeline);
        }
        self.anchor_ms = now_ms;
        self.paused_elapsed_ms = 0.0;
        self.state = PlaybackState::Playing;
        self.on_frame = Some(Box::new(on_frame));
        tracing::debug!(target: LOG_TARGET, now_ms, "playback started");
        Ok(())
    }

    /// Advance one frame. Returns the frame that was emitted, or `None` when
    /// not playing.
    pub fn update(&mut self, now_ms: f64) -> Option<FrameState> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let elapsed = now_ms - self.anchor_ms;
        let frame = self.compute_frame(elapsed);
        let weights = self.compute_weights(&frame);
        if let Some(cb) = self.on_frame.as_mut() {
            cb(&frame, &weights);
        }
        Some(frame)
    }

    /// Halt playback and synchronously emit one all-zero neutral frame.
    /// Idempotent and safe from any state.
    pub fn stop(&mut self) {
        let was = self.state;
        self.state = PlaybackState::Idle;
        self.paused_elapsed_ms = 0.0;

        let neutral = FrameState {
            playback: PlaybackState::Idle,
            viseme: Viseme::Silence,
            shape: MouthShape::default(),
            intensity: 0.0,
            elapsed_ms: 0.0,
        };
        let weights = MorphWeightMap::new();
        if let Some(cb) = self.on_frame.as_mut() {
            cb(&neutral, &weights);
        }
        if was != PlaybackState::Idle {
            tracing::debug!(target: LOG_TARGET, "playback stopped");
        }
    }

    pub fn pause(&mut self, now_ms: f64) {
        if self.state == PlaybackState::Playing {
            self.paused_elapsed_ms = now_ms - self.anchor_ms;
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume with elapsed-time continuity: the anchor is recomputed so the
    /// position is exactly where pause left it.
    pub fn resume(&mut self, now_ms: f64) {
        if self.state == PlaybackState::Paused {
            self.anchor_ms = now_ms - self.paused_elapsed_ms;
            self.state = PlaybackState::Playing;
        }
    }

    /// Jump to a timeline position without changing Playing/Paused state.
    pub fn seek_to(&mut self, position_ms: f64, now_ms: f64) {
        match self.state {
            PlaybackState::Playing => self.anchor_ms = now_ms - position_ms,
            PlaybackState::Paused | PlaybackState::Idle => {
                self.paused_elapsed_ms = position_ms;
                self.anchor_ms = now_ms - position_ms;
            }
        }
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        match self.state {
            PlaybackState::Playing => now_ms - self.anchor_ms,
            PlaybackState::Paused => self.paused_elapsed_ms,
            PlaybackState::Idle => 0.0,
        }
    }

    /// True once the timeline position has passed the last unit.
    pub fn finished(&self, now_ms: f64) -> bool {
        match (&self.timeline, self.state) {
            (Some(t), PlaybackState::Playing) => {
                self.elapsed_ms(now_ms) + self.sync_offset.offset_ms >= t.total_duration_ms
            }
            _ => false,
        }
    }

    fn compute_frame(&self, elapsed_ms: f64) -> FrameState {
        let position = elapsed_ms + self.sync_offset.offset_ms;
        let unit = self
            .timeline
            .as_ref()
            .and_then(|t| t.unit_at(position));

        let (viseme, intensity) = match unit {
            None => (Viseme::Silence, 0.0),
            Some(u) if u.is_silence() => (Viseme::Silence, 0.0),
            Some(u) => {
                let boost = if u.is_vowel() {
                    VOWEL_INTENSITY_BOOST
                } else {
                    1.0
                };
                (u.viseme, clamp01(u.confidence * boost))
            }
        };

        FrameState {
            playback: self.state,
            viseme,
            shape: morph::shape_for(viseme, intensity),
            intensity,
            elapsed_ms,
        }
    }

    fn compute_weights(&self, frame: &FrameState) -> MorphWeightMap {
        let mut out = MorphWeightMap::new();
        self.resolver.apply(frame.viseme, frame.intensity, &mut out);
        out
    }
}
