use crate::accent::{EmphasisStyle, HeadMovementStyle};
use crate::motion::{
    EmphasisHint, HeadRotation, IdleMotionLayer, IdleSettings, MorphDelta, MovementKind,
    MovementPlan, SpeechMotionLayer,
};
use crate::util::cubic_ease_in_out;

const LOG_TARGET: &str = "motion::orchestrator";

/// Below this magnitude per axis the idle head is treated as still and
/// speech rotation replaces it instead of overlaying.
const NEGLIGIBLE_RAD: f32 = 0.01;
const STATE_TRANSITION_MS: f64 = 300.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MotionState {
    #[default]
    Idle,
    Speaking,
    Questioning,
    Emphasizing,
}

/// Utterance context handed over on a state change.
#[derive(Clone, Debug, Default)]
pub struct SpeechContext {
    pub text: String,
    pub emphasis: EmphasisHint,
}

/// Composite per-frame output of all motion layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionFrame {
    pub state: MotionState,
    pub head: HeadRotation,
    pub spine: HeadRotation,
    pub hips: HeadRotation,
    pub blink_weight: f32,
    pub should_blink: bool,
    pub morph_targets: Vec<MorphDelta>,
    pub movement_type: Option<&'static str>,
    /// True while easing between states.
    pub transitioning: bool,
}

/// Drives the idle and speech layers from a small state machine and merges
/// their outputs into one frame.
pub struct MotionOrchestrator {
    state: MotionState,
    idle: IdleMotionLayer,
    speech: SpeechMotionLayer,
    head_style: HeadMovementStyle,
    plan: Option<MovementPlan>,
    plan_started_ms: f64,
    transition_started_ms: Option<f64>,
}

impl MotionOrchestrator {
    pub fn new(idle_settings: IdleSettings) -> Self {
        Self::from_parts(IdleMotionLayer::new(idle_settings))
    }

    pub fn with_seed(idle_settings: IdleSettings, seed: u64) -> Self {
        Self::from_parts(IdleMotionLayer::with_seed(idle_settings, seed))
    }

    fn from_parts(idle: IdleMotionLayer) -> Self {
        Self {
            state: MotionState::Idle,
            idle,
            speech: SpeechMotionLayer::new(),
            head_style: HeadMovementStyle::default(),
            plan: None,
            plan_started_ms: 0.0,
            transition_started_ms: None,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn set_idle_settings(&mut self, settings: IdleSettings) {
        self.idle.set_settings(settings);
    }

    /// Accent-derived movement style; applied to plans built afterwards.
    pub fn set_head_style(&mut self, style: HeadMovementStyle) {
        self.head_style = style;
    }

    pub fn active_plan(&self) -> Option<&MovementPlan> {
        self.plan.as_ref()
    }

    /// Replace the active plan in place, keeping its start time. Used to
    /// swap in a sensitivity-scaled rewrite of the plan just built.
    pub fn set_plan(&mut self, plan: MovementPlan) {
        self.plan = Some(plan);
    }

    /// Switch state, analysing the context text into a movement plan when one
    /// is supplied. Passing no context clears any running plan.
    pub fn change_state(
        &mut self,
        state: MotionState,
        context: Option<&SpeechContext>,
        now_ms: f64,
    ) {
        if state != self.state {
            self.transition_started_ms = Some(now_ms);
        }
        tracing::debug!(
            target: LOG_TARGET,
            from = ?self.state,
            to = ?state,
            has_context = context.is_some(),
            "motion state change"
        );
        self.state = state;

        match context {
            Some(ctx) => {
                let mut plan = self.speech.analyze(&ctx.text, ctx.emphasis);
                self.apply_head_style(&mut plan);
                self.plan_started_ms = now_ms;
                self.plan = Some(plan);
            }
            None => self.plan = None,
        }
    }

    /// Scale planned movements by the accent's head-movement tendencies.
    fn apply_head_style(&self, plan: &mut MovementPlan) {
        let nod_scale = 0.7 + 0.6 * self.head_style.nod_frequency;
        let tilt_scale = 0.7 + 0.6 * self.head_style.tilt_tendency;
        let gesture_scale = match self.head_style.emphasis_style {
            EmphasisStyle::Subtle => 0.7,
            EmphasisStyle::Moderate => 1.0,
            EmphasisStyle::Expressive => 1.3,
        };
        for movement in &mut plan.head_movements {
            let scale = match movement.kind {
                MovementKind::Nod | MovementKind::Shake => nod_scale,
                MovementKind::Tilt | MovementKind::Turn => tilt_scale,
            };
            movement.intensity = (movement.intensity * scale).min(1.0);
        }
        for gesture in &mut plan.gestures {
            gesture.intensity = (gesture.intensity * gesture_scale).min(1.0);
        }
    }

    /// Produce one merged frame. `now_ms` and `delta_ms` come from the host
    /// render loop.
    pub fn update(&mut self, now_ms: f64, delta_ms: f64) -> MotionFrame {
        let idle = self.idle.update(delta_ms, now_ms);

        let transition_progress = match self.transition_started_ms {
            Some(started) => {
                let p = ((now_ms - started) / STATE_TRANSITION_MS).clamp(0.0, 1.0);
                if p >= 1.0 {
                    self.transition_started_ms = None;
                }
                cubic_ease_in_out(p as f32)
            }
            None => 1.0,
        };
        let transitioning = self.transition_started_ms.is_some();

        let mut speech_rotation = HeadRotation::ZERO;
        let mut morph_targets = Vec::new();
        let mut movement_type = None;

        if let Some(plan) = &self.plan {
            let at_ms = now_ms - self.plan_started_ms;
            if at_ms >= plan.duration_ms {
                self.plan = None;
            } else {
                let reduced = self.speech.reduce(plan, at_ms);
                speech_rotation = reduced.head_rotation.scale(transition_progress);
                morph_targets = reduced.morph_targets;
                movement_type = reduced.movement_type;
            }
        }

        // Speech rotation overlays the idle base. Idle drops out only when it
        // has nothing to contribute.
        let head = if idle.head.is_negligible(NEGLIGIBLE_RAD) {
            speech_rotation
        } else {
            idle.head.add(speech_rotation)
        };

        MotionFrame {
            state: self.state,
            head,
            spine: idle.spine,
            hips: idle.hips,
            blink_weight: idle.blink_weight,
            should_blink: idle.should_blink,
            morph_targets,
            movement_type,
            transitioning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> MotionOrchestrator {
        MotionOrchestrator::with_seed(IdleSettings::default(), 7)
    }

    fn question_context() -> SpeechContext {
        SpeechContext {
            text: "Where is it?".to_owned(),
            emphasis: EmphasisHint::Normal,
        }
    }

    #[test]
    fn starts_idle_without_plan() {
        let mut o = orchestrator();
        let frame = o.update(16.0, 16.0);
        assert_eq!(frame.state, MotionState::Idle);
        assert!(frame.morph_targets.is_empty());
        assert!(o.active_plan().is_none());
    }

    #[test]
    fn context_builds_a_plan_and_speech_takes_the_head() {
        let mut o = orchestrator();
        o.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        assert!(o.active_plan().is_some());

        // Sample past the transition window, mid-movement.
        let frame = o.update(400.0, 400.0);
        assert_eq!(frame.state, MotionState::Questioning);
        assert_eq!(frame.movement_type, Some("tilt"));
        assert!(frame.head.roll.abs() > NEGLIGIBLE_RAD);
        assert!(!frame.morph_targets.is_empty());
    }

    #[test]
    fn plan_expires_after_its_duration() {
        let mut o = orchestrator();
        o.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        let total = o.active_plan().map(|p| p.duration_ms).unwrap_or_default();
        let frame = o.update(total + 50.0, total + 50.0);
        assert!(o.active_plan().is_none());
        assert!(frame.morph_targets.is_empty());
    }

    #[test]
    fn state_change_without_context_clears_the_plan() {
        let mut o = orchestrator();
        o.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        o.change_state(MotionState::Idle, None, 100.0);
        assert!(o.active_plan().is_none());
    }

    #[test]
    fn transition_flag_clears_after_the_window() {
        let mut o = orchestrator();
        o.change_state(MotionState::Speaking, Some(&question_context()), 0.0);
        let during = o.update(100.0, 100.0);
        assert!(during.transitioning);
        let after = o.update(STATE_TRANSITION_MS + 50.0, STATE_TRANSITION_MS - 50.0);
        assert!(!after.transitioning);
    }

    #[test]
    fn expressive_head_style_amplifies_planned_movement() {
        let mut plain = orchestrator();
        plain.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        let base = plain.active_plan().map(|p| p.head_movements[0].intensity);

        let mut expressive = orchestrator();
        expressive.set_head_style(HeadMovementStyle {
            nod_frequency: 1.0,
            tilt_tendency: 1.0,
            emphasis_style: EmphasisStyle::Expressive,
        });
        expressive.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        let boosted = expressive.active_plan().map(|p| p.head_movements[0].intensity);

        assert!(boosted > base);
    }

    #[test]
    fn idle_head_motion_overlays_under_speech() {
        let mut o = MotionOrchestrator::with_seed(
            IdleSettings {
                level: crate::motion::IntensityLevel::Enhanced,
                intensity_scale: 3.0,
                ..IdleSettings::default()
            },
            7,
        );
        o.change_state(MotionState::Questioning, Some(&question_context()), 0.0);
        let frame = o.update(400.0, 400.0);
        // The question tilt carries roll; any pitch in the merged head can
        // only come from the idle base, so it must survive the merge.
        assert!(frame.head.roll.abs() > NEGLIGIBLE_RAD);
        assert!(frame.head.pitch.abs() > 0.0);
    }

    #[test]
    fn idle_continues_under_speech() {
        let mut o = orchestrator();
        o.change_state(MotionState::Speaking, Some(&question_context()), 0.0);
        let frame = o.update(1_000.0, 1_000.0);
        // Spine breathing is untouched by the speech layer.
        assert!(frame.spine.pitch.abs() > 0.0);
    }
}
