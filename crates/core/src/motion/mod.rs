mod idle;
mod orchestrator;
mod sensitivity;
mod speech;

use crate::util::Easing;
use serde::{Deserialize, Serialize};

pub use idle::{IdleMotionLayer, IdleOutput, IdleSettings};
pub use orchestrator::{MotionFrame, MotionOrchestrator, MotionState, SpeechContext};
pub use sensitivity::{
    scale_movement_plan, AlternativeIndicator, CategorySettings, IndicatorKind,
    MotionSensitivitySettings, ScaledPlan, SuppressionReason,
};
pub use speech::{EmphasisHint, QuestionKind, ReducedMotion, SpeechMotionLayer};

/// Head rotation in radians: pitch (nod axis), yaw (turn axis), roll (tilt
/// axis).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HeadRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl HeadRotation {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn add(self, other: Self) -> Self {
        Self {
            pitch: self.pitch + other.pitch,
            yaw: self.yaw + other.yaw,
            roll: self.roll + other.roll,
        }
    }

    pub fn scale(self, factor: f32) -> Self {
        Self {
            pitch: self.pitch * factor,
            yaw: self.yaw * factor,
            roll: self.roll * factor,
        }
    }

    /// Small enough on every axis to be replaced rather than summed.
    pub fn is_negligible(self, epsilon: f32) -> bool {
        self.pitch.abs() < epsilon && self.yaw.abs() < epsilon && self.roll.abs() < epsilon
    }
}

/// Overall animation energy tier.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntensityLevel {
    Minimal,
    Reduced,
    #[default]
    Standard,
    Enhanced,
}

impl IntensityLevel {
    pub fn factor(self) -> f32 {
        match self {
            IntensityLevel::Minimal => 0.2,
            IntensityLevel::Reduced => 0.5,
            IntensityLevel::Standard => 1.0,
            IntensityLevel::Enhanced => 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MovementKind {
    Nod,
    Tilt,
    Turn,
    Shake,
}

impl MovementKind {
    pub fn label(self) -> &'static str {
        match self {
            MovementKind::Nod => "nod",
            MovementKind::Tilt => "tilt",
            MovementKind::Turn => "turn",
            MovementKind::Shake => "shake",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MovementDirection {
    #[default]
    Center,
    Left,
    Right,
    Up,
    Down,
}

impl MovementDirection {
    /// Sign convention: left/down negative, right/up positive.
    pub fn sign(self) -> f32 {
        match self {
            MovementDirection::Left | MovementDirection::Down => -1.0,
            MovementDirection::Right | MovementDirection::Up => 1.0,
            MovementDirection::Center => 0.0,
        }
    }
}

/// One discrete head movement within a plan.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HeadMovement {
    pub kind: MovementKind,
    pub direction: MovementDirection,
    pub intensity: f32,
    pub duration_ms: f64,
    pub start_ms: f64,
    pub easing: Easing,
}

impl HeadMovement {
    pub fn active_at(&self, at_ms: f64) -> bool {
        at_ms >= self.start_ms && at_ms < self.start_ms + self.duration_ms
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Additive,
    Replace,
}

/// Named morph-target contribution attached to a gesture.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MorphDelta {
    pub target: String,
    pub weight: f32,
    pub blend: BlendMode,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GestureKind {
    BrowRaise,
    EyeFocus,
    EyeWiden,
    SmilePulse,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub intensity: f32,
    pub duration_ms: f64,
    pub timing_ms: f64,
    pub morph_targets: Vec<MorphDelta>,
}

/// Produced per state-change or per utterance; consumed once, not retained.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MovementPlan {
    pub head_movements: Vec<HeadMovement>,
    pub gestures: Vec<Gesture>,
    pub duration_ms: f64,
    pub priority: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_levels_match_documented_factors() {
        assert_eq!(IntensityLevel::Minimal.factor(), 0.2);
        assert_eq!(IntensityLevel::Reduced.factor(), 0.5);
        assert_eq!(IntensityLevel::Standard.factor(), 1.0);
        assert_eq!(IntensityLevel::Enhanced.factor(), 1.5);
    }

    #[test]
    fn negligible_rotation_threshold() {
        let tiny = HeadRotation {
            pitch: 0.005,
            yaw: -0.003,
            roll: 0.0,
        };
        assert!(tiny.is_negligible(0.01));
        let nod = HeadRotation {
            pitch: 0.1,
            ..HeadRotation::ZERO
        };
        assert!(!nod.is_negligible(0.01));
    }

    #[test]
    fn movement_activity_window() {
        let m = HeadMovement {
            kind: MovementKind::Nod,
            direction: MovementDirection::Down,
            intensity: 0.5,
            duration_ms: 400.0,
            start_ms: 100.0,
            easing: Easing::CubicInOut,
        };
        assert!(!m.active_at(50.0));
        assert!(m.active_at(100.0));
        assert!(m.active_at(499.0));
        assert!(!m.active_at(500.0));
    }
}
