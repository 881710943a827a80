use crate::motion::{HeadRotation, IntensityLevel};
use crate::util::clamp01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

const BREATHING_HZ: f32 = 0.25; // ~15 breaths/min
const MICRO_HZ: f32 = 0.08;
const SWAY_HZ: f32 = 0.03;

const BREATHING_AMPLITUDE: f32 = 0.02;
const MICRO_AMPLITUDE: f32 = 0.005;
const SWAY_AMPLITUDE: f32 = 0.01;
/// Hip counter-rotation against spine sway simulates weight shift.
const HIP_COUNTER_WEIGHT: f32 = -0.6;

const BLINK_BASE_INTERVAL_MS: f64 = 5_000.0;
const BLINK_MAX_JITTER_MS: f64 = 3_000.0;
const BLINK_MIN_DURATION_MS: f64 = 150.0;
const BLINK_MAX_DURATION_MS: f64 = 250.0;
/// Fraction of the blink spent closing; the rest reopens more slowly.
const BLINK_CLOSE_FRACTION: f64 = 0.3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IdleSettings {
    pub enabled: bool,
    pub level: IntensityLevel,
    /// Continuous user multiplier on top of the level factor.
    pub intensity_scale: f32,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: IntensityLevel::Standard,
            intensity_scale: 1.0,
        }
    }
}

/// Per-frame idle layer output, already intensity-scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IdleOutput {
    pub head: HeadRotation,
    pub spine: HeadRotation,
    pub hips: HeadRotation,
    pub blink_weight: f32,
    pub should_blink: bool,
}

struct ActiveBlink {
    started_ms: f64,
    duration_ms: f64,
}

/// Oscillator-based breathing/sway/blink generator.
///
/// Phase accumulators advance by delta time so pausing the host loop pauses
/// the motion; blink scheduling runs on the caller-supplied elapsed clock.
pub struct IdleMotionLayer {
    settings: IdleSettings,
    breathing_phase: f32,
    micro_phase: f32,
    sway_phase: f32,
    last_blink_ms: f64,
    next_interval_ms: f64,
    blink: Option<ActiveBlink>,
    rng: StdRng,
}

impl IdleMotionLayer {
    pub fn new(settings: IdleSettings) -> Self {
        Self::with_seed(settings, rand::rng().random())
    }

    pub fn with_seed(settings: IdleSettings, seed: u64) -> Self {
        Self {
            settings,
            breathing_phase: 0.0,
            micro_phase: 0.0,
            sway_phase: 0.0,
            last_blink_ms: 0.0,
            // First interval is the plain base so blink cadence is
            // predictable from session start; jitter kicks in afterwards.
            next_interval_ms: BLINK_BASE_INTERVAL_MS,
            blink: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn settings(&self) -> &IdleSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: IdleSettings) {
        self.settings = settings;
    }

    /// Advance all oscillators and the blink state machine.
    pub fn update(&mut self, delta_ms: f64, elapsed_ms: f64) -> IdleOutput {
        if !self.settings.enabled {
            return IdleOutput::default();
        }

        let dt = (delta_ms / 1_000.0) as f32;
        self.breathing_phase = (self.breathing_phase + TAU * BREATHING_HZ * dt) % TAU;
        self.micro_phase = (self.micro_phase + TAU * MICRO_HZ * dt) % TAU;
        self.sway_phase = (self.sway_phase + TAU * SWAY_HZ * dt) % TAU;

        let scale = self.settings.level.factor() * self.settings.intensity_scale;

        // Breathing: fundamental plus a 30% second-partial for a natural
        // inhale/exhale asymmetry. Spine carries it; head gets 10%.
        let breath = self.breathing_phase.sin() + 0.3 * (self.breathing_phase * 1.3).sin();
        let mut spine = HeadRotation {
            pitch: breath * BREATHING_AMPLITUDE,
            ..HeadRotation::ZERO
        };
        let mut head = HeadRotation {
            pitch: breath * BREATHING_AMPLITUDE * 0.1,
            ..HeadRotation::ZERO
        };

        // Micro-movement: three phase-shifted components per axis so the
        // jitter never visibly repeats.
        let p = self.micro_phase;
        head.pitch += (p.sin() * 0.5 + (p * 2.3 + 1.1).sin() * 0.3 + (p * 3.7 + 2.4).sin() * 0.2)
            * MICRO_AMPLITUDE;
        head.yaw += ((p + 0.7).sin() * 0.5 + (p * 1.9 + 0.3).sin() * 0.3 + (p * 4.1).sin() * 0.2)
            * MICRO_AMPLITUDE;
        head.roll += ((p + 1.9).sin() * 0.4 + (p * 2.7 + 1.7).sin() * 0.3) * MICRO_AMPLITUDE;

        // Sway: spine leads, hips counter-rotate, head follows faintly.
        let sway = self.sway_phase.sin();
        spine.roll += sway * SWAY_AMPLITUDE;
        let hips = HeadRotation {
            roll: sway * SWAY_AMPLITUDE * HIP_COUNTER_WEIGHT,
            ..HeadRotation::ZERO
        };
        head.roll += sway * SWAY_AMPLITUDE * 0.2;

        let (blink_weight, should_blink) = self.update_blink(elapsed_ms);

        IdleOutput {
            head: head.scale(scale),
            spine: spine.scale(scale),
            hips: hips.scale(scale),
            blink_weight: clamp01(blink_weight * scale),
            should_blink,
        }
    }

    fn update_blink(&mut self, elapsed_ms: f64) -> (f32, bool) {
        if let Some(active) = &self.blink {
            let t = (elapsed_ms - active.started_ms) / active.duration_ms;
            if t >= 1.0 {
                self.last_blink_ms = active.started_ms + active.duration_ms;
                self.blink = None;
                self.schedule_next(elapsed_ms);
                return (0.0, false);
            }
            let weight = if t < BLINK_CLOSE_FRACTION {
                // Quick close.
                ((t / BLINK_CLOSE_FRACTION) * std::f64::consts::FRAC_PI_2).sin()
            } else {
                // Slower open.
                let u = (t - BLINK_CLOSE_FRACTION) / (1.0 - BLINK_CLOSE_FRACTION);
                (u * std::f64::consts::FRAC_PI_2).cos()
            };
            return (weight as f32, true);
        }

        if elapsed_ms - self.last_blink_ms >= self.next_interval_ms {
            let duration = BLINK_MIN_DURATION_MS
                + self.rng.random::<f64>() * (BLINK_MAX_DURATION_MS - BLINK_MIN_DURATION_MS);
            self.blink = Some(ActiveBlink {
                started_ms: elapsed_ms,
                duration_ms: duration,
            });
            return (0.0, true);
        }

        (0.0, false)
    }

    fn schedule_next(&mut self, elapsed_ms: f64) {
        // Jitter amplitude itself drifts over time so the cadence never
        // settles into a fixed rhythm.
        let drift = 0.5 + 0.5 * (elapsed_ms / 10_000.0).sin();
        let jitter = (self.rng.random::<f64>() * 2.0 - 1.0) * BLINK_MAX_JITTER_MS * drift;
        self.next_interval_ms = (BLINK_BASE_INTERVAL_MS + jitter).max(BLINK_MIN_DURATION_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> IdleMotionLayer {
        IdleMotionLayer::with_seed(IdleSettings::default(), 7)
    }

    #[test]
    fn disabled_layer_is_all_zero() {
        let mut layer = IdleMotionLayer::with_seed(
            IdleSettings {
                enabled: false,
                ..IdleSettings::default()
            },
            7,
        );
        let out = layer.update(16.0, 16.0);
        assert_eq!(out, IdleOutput::default());
    }

    #[test]
    fn breathing_moves_spine_more_than_head() {
        let mut layer = layer();
        // Quarter of a breathing cycle: sin near 1.
        let out = layer.update(1_000.0, 1_000.0);
        assert!(out.spine.pitch.abs() > 0.0);
        assert!(out.head.pitch.abs() < out.spine.pitch.abs());
    }

    #[test]
    fn sway_counter_rotates_hips() {
        let mut layer = layer();
        // Advance well into the slow sway cycle.
        let mut out = IdleOutput::default();
        for i in 1..=10 {
            out = layer.update(1_000.0, i as f64 * 1_000.0);
        }
        if out.spine.roll.abs() > 1e-6 {
            assert!(out.hips.roll.signum() != out.spine.roll.signum());
            assert!((out.hips.roll / out.spine.roll).abs() < 1.0);
        }
    }

    #[test]
    fn blink_triggers_after_interval_and_releases() {
        let mut layer = layer();

        let first = layer.update(0.0, 0.0);
        assert!(!first.should_blink);

        // 5.5 s with no prior blink: the 5 s base interval has elapsed.
        let second = layer.update(5_500.0, 5_500.0);
        assert!(second.should_blink);

        // Mid-blink the weight is nonzero.
        let mid = layer.update(60.0, 5_560.0);
        assert!(mid.should_blink);
        assert!(mid.blink_weight > 0.0);

        // After the maximum blink duration the weight returns to zero.
        let after = layer.update(300.0, 5_860.0);
        assert!(!after.should_blink);
        assert_eq!(after.blink_weight, 0.0);
    }

    #[test]
    fn blink_weight_stays_in_unit_range() {
        let mut layer = layer();
        let mut t = 0.0;
        for _ in 0..2_000 {
            t += 16.0;
            let out = layer.update(16.0, t);
            assert!((0.0..=1.0).contains(&out.blink_weight));
        }
    }

    #[test]
    fn minimal_level_scales_everything_down() {
        let mut standard = layer();
        let mut minimal = IdleMotionLayer::with_seed(
            IdleSettings {
                level: IntensityLevel::Minimal,
                ..IdleSettings::default()
            },
            7,
        );
        let s = standard.update(1_000.0, 1_000.0);
        let m = minimal.update(1_000.0, 1_000.0);
        assert!(m.spine.pitch.abs() < s.spine.pitch.abs());
    }
}
