use crate::motion::{
    BlendMode, Gesture, GestureKind, HeadMovement, HeadRotation, MorphDelta, MovementDirection,
    MovementKind, MovementPlan,
};
use crate::util::{clamp01, Easing};
use serde::{Deserialize, Serialize};

const INTERROGATIVES: &[&str] = &[
    "what", "where", "when", "why", "who", "whose", "which", "how", "is", "are", "do", "does",
    "did", "can", "could", "will", "would", "should",
];
const WH_WORDS: &[&str] = &["what", "where", "when", "why", "who", "whose", "which", "how"];
const RHETORICAL_MARKERS: &[&str] = &["right?", "isn't it", "don't you think"];
const IMPORTANT_WORDS: &[&str] = &[
    "important", "critical", "essential", "must", "never", "always", "urgent", "amazing",
    "excellent", "great", "remember",
];

const EMPHASIS_EVENT_THRESHOLD: f32 = 0.6;

/// Base amplitude in radians for a full-intensity head movement.
const MOVEMENT_AMPLITUDE: f32 = 0.15;
const SHAKE_PERIOD_MS: f64 = 160.0;

const QUESTION_MOVEMENT_MS: f64 = 800.0;
const EMPHASIS_MOVEMENT_MS: f64 = 400.0;
/// Successive events are staggered so movements do not stack on one instant.
const EVENT_STAGGER_MS: f64 = 350.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionKind {
    Wh,
    YesNo,
    Rhetorical,
}

/// Caller-declared emphasis expectation for the utterance.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmphasisHint {
    Low,
    #[default]
    Normal,
    High,
}

impl EmphasisHint {
    fn factor(self) -> f32 {
        match self {
            EmphasisHint::Low => 0.5,
            EmphasisHint::Normal => 1.0,
            EmphasisHint::High => 1.5,
        }
    }
}

/// Combined output of the plan reducer for one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedMotion {
    pub head_rotation: HeadRotation,
    pub morph_targets: Vec<MorphDelta>,
    /// Label of the movement kind contributing most rotation.
    pub movement_type: Option<&'static str>,
    pub peak_gesture_intensity: f32,
}

/// Analyzes speech text for questions and emphasis and turns them into
/// discrete head-movement/gesture events.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeechMotionLayer;

impl SpeechMotionLayer {
    pub fn new() -> Self {
        Self
    }

    /// Build a movement plan for an utterance.
    pub fn analyze(&self, text: &str, emphasis: EmphasisHint) -> MovementPlan {
        let mut head_movements = Vec::new();
        let mut gestures = Vec::new();
        let mut slot = 0usize;

        for sentence in split_sentences_keep_terminator(text) {
            if let Some(kind) = classify_question(&sentence) {
                let start_ms = slot as f64 * EVENT_STAGGER_MS;
                slot += 1;
                head_movements.push(question_movement(kind, start_ms));
                gestures.push(question_gesture(kind, start_ms));
            }
        }

        for word in text.split_whitespace() {
            let score = emphasis_score(word, emphasis);
            if score > EMPHASIS_EVENT_THRESHOLD {
                let start_ms = slot as f64 * EVENT_STAGGER_MS;
                slot += 1;
                head_movements.push(HeadMovement {
                    kind: MovementKind::Nod,
                    direction: MovementDirection::Down,
                    intensity: score,
                    duration_ms: EMPHASIS_MOVEMENT_MS,
                    start_ms,
                    easing: Easing::CubicInOut,
                });
                gestures.push(Gesture {
                    kind: GestureKind::EyeFocus,
                    intensity: score,
                    duration_ms: EMPHASIS_MOVEMENT_MS,
                    timing_ms: start_ms,
                    morph_targets: vec![
                        MorphDelta {
                            target: "browDownLeft".to_owned(),
                            weight: clamp01(score * 0.4),
                            blend: BlendMode::Additive,
                        },
                        MorphDelta {
                            target: "browDownRight".to_owned(),
                            weight: clamp01(score * 0.4),
                            blend: BlendMode::Additive,
                        },
                        MorphDelta {
                            target: "eyeSquint".to_owned(),
                            weight: clamp01(score * 0.3),
                            blend: BlendMode::Additive,
                        },
                    ],
                });
            }
        }

        let duration_ms = head_movements
            .iter()
            .map(|m| m.start_ms + m.duration_ms)
            .fold(0.0_f64, f64::max);

        MovementPlan {
            head_movements,
            gestures,
            duration_ms,
            priority: 1,
        }
    }

    /// Combine all movements active at `at_ms` into one rotation vector and
    /// concatenate the gesture morph lists.
    pub fn reduce(&self, plan: &MovementPlan, at_ms: f64) -> ReducedMotion {
        let mut rotation = HeadRotation::ZERO;
        let mut dominant: Option<(&'static str, f32)> = None;

        for movement in &plan.head_movements {
            if !movement.active_at(at_ms) {
                continue;
            }
            let t = ((at_ms - movement.start_ms) / movement.duration_ms) as f32;
            // Rise to peak at the midpoint, return to rest at the end.
            let envelope = movement.easing.apply(1.0 - (2.0 * t - 1.0).abs());
            let amount = movement.intensity * envelope * MOVEMENT_AMPLITUDE;

            let contribution = match movement.kind {
                MovementKind::Nod => HeadRotation {
                    // Nods read downward first.
                    pitch: -amount,
                    ..HeadRotation::ZERO
                },
                MovementKind::Tilt => HeadRotation {
                    roll: amount * movement.direction.sign(),
                    ..HeadRotation::ZERO
                },
                MovementKind::Turn => HeadRotation {
                    yaw: amount * movement.direction.sign(),
                    ..HeadRotation::ZERO
                },
                MovementKind::Shake => HeadRotation {
                    yaw: amount * ((at_ms / SHAKE_PERIOD_MS) * std::f64::consts::TAU).sin() as f32,
                    ..HeadRotation::ZERO
                },
            };
            rotation = rotation.add(contribution);

            let magnitude =
                contribution.pitch.abs() + contribution.yaw.abs() + contribution.roll.abs();
            if dominant.is_none_or(|(_, best)| magnitude > best) {
                dominant = Some((movement.kind.label(), magnitude));
            }
        }

        let mut morph_targets = Vec::new();
        let mut peak = 0.0_f32;
        for gesture in &plan.gestures {
            if at_ms < gesture.timing_ms || at_ms >= gesture.timing_ms + gesture.duration_ms {
                continue;
            }
            peak = peak.max(gesture.intensity);
            morph_targets.extend(gesture.morph_targets.iter().cloned());
        }

        ReducedMotion {
            head_rotation: rotation,
            morph_targets,
            movement_type: dominant.map(|(label, _)| label),
            peak_gesture_intensity: peak,
        }
    }
}

fn split_sentences_keep_terminator(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            if !current.trim().is_empty() {
                out.push(current.trim().to_owned());
            }
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_owned());
    }
    out
}

fn classify_question(sentence: &str) -> Option<QuestionKind> {
    let lower = sentence.to_lowercase();
    let first_word: String = lower
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    let is_question = lower.trim_end().ends_with('?')
        || INTERROGATIVES.contains(&first_word.as_str());
    if !is_question {
        return None;
    }

    if RHETORICAL_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(QuestionKind::Rhetorical)
    } else if WH_WORDS.contains(&first_word.as_str()) {
        Some(QuestionKind::Wh)
    } else {
        Some(QuestionKind::YesNo)
    }
}

fn question_movement(kind: QuestionKind, start_ms: f64) -> HeadMovement {
    match kind {
        QuestionKind::Wh => HeadMovement {
            kind: MovementKind::Tilt,
            direction: MovementDirection::Left,
            intensity: 0.7,
            duration_ms: QUESTION_MOVEMENT_MS,
            start_ms,
            easing: Easing::CubicInOut,
        },
        QuestionKind::YesNo => HeadMovement {
            kind: MovementKind::Tilt,
            direction: MovementDirection::Right,
            intensity: 0.6,
            duration_ms: QUESTION_MOVEMENT_MS,
            start_ms,
            easing: Easing::CubicInOut,
        },
        QuestionKind::Rhetorical => HeadMovement {
            kind: MovementKind::Nod,
            direction: MovementDirection::Down,
            intensity: 0.5,
            duration_ms: QUESTION_MOVEMENT_MS,
            start_ms,
            easing: Easing::SinOut,
        },
    }
}

fn question_gesture(kind: QuestionKind, timing_ms: f64) -> Gesture {
    let intensity = match kind {
        QuestionKind::Wh => 0.7,
        QuestionKind::YesNo => 0.6,
        QuestionKind::Rhetorical => 0.5,
    };
    Gesture {
        kind: GestureKind::BrowRaise,
        intensity,
        duration_ms: QUESTION_MOVEMENT_MS,
        timing_ms,
        morph_targets: vec![
            MorphDelta {
                target: "browInnerUp".to_owned(),
                weight: clamp01(intensity * 0.8),
                blend: BlendMode::Additive,
            },
            MorphDelta {
                target: "eyeWideLeft".to_owned(),
                weight: clamp01(intensity * 0.3),
                blend: BlendMode::Additive,
            },
            MorphDelta {
                target: "eyeWideRight".to_owned(),
                weight: clamp01(intensity * 0.3),
                blend: BlendMode::Additive,
            },
        ],
    }
}

/// Per-word emphasis: all-caps +0.8, exclamation +0.6, important-word +0.5,
/// scaled by the context hint and clamped to [0, 1].
fn emphasis_score(word: &str, hint: EmphasisHint) -> f32 {
    let mut score = 0.0_f32;
    let alphabetic: String = word.chars().filter(|c| c.is_alphabetic()).collect();
    if alphabetic.len() > 1 && alphabetic.chars().all(|c| c.is_uppercase()) {
        score += 0.8;
    }
    if word.contains('!') {
        score += 0.6;
    }
    if IMPORTANT_WORDS.contains(&alphabetic.to_lowercase().as_str()) {
        score += 0.5;
    }
    clamp01(score * hint.factor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wh_question_tilts_left() {
        let plan = SpeechMotionLayer::new().analyze("Where is the station?", EmphasisHint::Normal);
        assert_eq!(plan.head_movements.len(), 1);
        let movement = &plan.head_movements[0];
        assert_eq!(movement.kind, MovementKind::Tilt);
        assert_eq!(movement.direction, MovementDirection::Left);
        assert_eq!(plan.gestures.len(), 1);
        assert_eq!(plan.gestures[0].kind, GestureKind::BrowRaise);
    }

    #[test]
    fn yes_no_question_tilts_right() {
        let plan = SpeechMotionLayer::new().analyze("Are you coming?", EmphasisHint::Normal);
        assert_eq!(plan.head_movements[0].direction, MovementDirection::Right);
    }

    #[test]
    fn rhetorical_question_nods() {
        let plan =
            SpeechMotionLayer::new().analyze("That was easy, right?", EmphasisHint::Normal);
        assert_eq!(plan.head_movements[0].kind, MovementKind::Nod);
    }

    #[test]
    fn statement_produces_no_question_movement() {
        let plan = SpeechMotionLayer::new().analyze("The sky is blue.", EmphasisHint::Normal);
        assert!(plan.head_movements.is_empty());
    }

    #[test]
    fn caps_and_exclamations_become_emphasis_events() {
        let plan = SpeechMotionLayer::new().analyze("This is VERY neat!", EmphasisHint::Normal);
        // "VERY" scores 0.8; "neat!" scores 0.6 which does not pass the
        // threshold.
        assert_eq!(plan.head_movements.len(), 1);
        assert_eq!(plan.head_movements[0].kind, MovementKind::Nod);
        assert!(plan.head_movements[0].intensity > 0.7);
    }

    #[test]
    fn low_emphasis_context_suppresses_events() {
        let plan = SpeechMotionLayer::new().analyze("This is VERY neat!", EmphasisHint::Low);
        assert!(plan.head_movements.is_empty());
    }

    #[test]
    fn high_emphasis_context_amplifies() {
        let score = emphasis_score("important", EmphasisHint::High);
        assert!(score > EMPHASIS_EVENT_THRESHOLD);
        assert!(score <= 1.0);
    }

    #[test]
    fn reducer_maps_kinds_to_axes() {
        let layer = SpeechMotionLayer::new();
        let plan = layer.analyze("Where is it?", EmphasisHint::Normal);
        // Sample mid-movement where the envelope peaks.
        let reduced = layer.reduce(&plan, QUESTION_MOVEMENT_MS / 2.0);
        assert!(reduced.head_rotation.roll < 0.0); // left tilt
        assert_eq!(reduced.head_rotation.pitch, 0.0);
        assert_eq!(reduced.movement_type, Some("tilt"));
        assert!(!reduced.morph_targets.is_empty());
        assert!(reduced.peak_gesture_intensity > 0.0);
    }

    #[test]
    fn reducer_is_quiet_outside_movement_windows() {
        let layer = SpeechMotionLayer::new();
        let plan = layer.analyze("Where is it?", EmphasisHint::Normal);
        let reduced = layer.reduce(&plan, plan.duration_ms + 100.0);
        assert_eq!(reduced.head_rotation, HeadRotation::ZERO);
        assert!(reduced.morph_targets.is_empty());
        assert_eq!(reduced.movement_type, None);
    }

    #[test]
    fn plan_duration_covers_all_events() {
        let plan = SpeechMotionLayer::new()
            .analyze("Why? REALLY! Are you sure?", EmphasisHint::Normal);
        for m in &plan.head_movements {
            assert!(m.start_ms + m.duration_ms <= plan.duration_ms);
        }
    }
}
