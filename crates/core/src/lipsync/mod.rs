mod fallback;
mod morph;
mod scheduler;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use fallback::{LipSyncLayer, LipSyncPipeline, LipSyncPlan, PrepareError};
pub use morph::{DefaultMorphResolver, MorphTargetResolver, VisemeParams};
pub use scheduler::{FrameState, LipSyncError, LipSyncScheduler, PlaybackState};

/// Morph-target name to weight, recomputed every animation frame.
/// Weights are individually clamped to [0, 1]; additive blending means they
/// need not sum to 1.
pub type MorphWeightMap = BTreeMap<String, f32>;

/// Mouth-shape parameters derived per frame from the current phoneme.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MouthShape {
    /// Jaw openness, 0 closed .. 1 fully open.
    pub openness: f32,
    /// Lip rounding/spreading, -1 spread .. 1 rounded.
    pub lip_position: f32,
    /// Tongue visibility/height, 0 .. 1.
    pub tongue_position: f32,
}
