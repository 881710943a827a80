//! Frame hand-off to the host renderer.
//!
//! The core never talks to a graphics API. It produces [`AvatarFrame`]
//! values and pushes them into a [`FrameSink`] supplied by the embedder.

use crate::lipsync::MorphWeightMap;
use crate::motion::{AlternativeIndicator, MotionFrame};

const LOG_TARGET: &str = "render";

/// Everything the renderer needs for one frame of the avatar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AvatarFrame {
    pub now_ms: f64,
    pub motion: MotionFrame,
    /// Mouth morph-target weights from the lip-sync scheduler; empty while
    /// not speaking.
    pub mouth: MorphWeightMap,
    pub speaking: bool,
    /// Non-motion cues substituted for suppressed movement this utterance.
    pub indicators: Vec<AlternativeIndicator>,
}

pub trait FrameSink: Send {
    fn submit(&mut self, frame: &AvatarFrame);
}

/// Discards every frame. Useful when only the side effects of a session
/// matter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn submit(&mut self, _frame: &AvatarFrame) {}
}

/// Logs a compact line per frame; the demo binary's stand-in renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFrameSink;

impl FrameSink for TracingFrameSink {
    fn submit(&mut self, frame: &AvatarFrame) {
        tracing::debug!(
            target: LOG_TARGET,
            now_ms = frame.now_ms,
            speaking = frame.speaking,
            state = ?frame.motion.state,
            head_pitch = frame.motion.head.pitch,
            head_yaw = frame.motion.head.yaw,
            head_roll = frame.motion.head.roll,
            blink = frame.motion.blink_weight,
            mouth_targets = frame.mouth.len(),
            "frame"
        );
    }
}
