use crate::accent::AccentProfile;
use crate::util::{cubic_ease_in_out, lerp};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "accent::blender";

/// Progress threshold at which categorical map fields flip from source to
/// target values.
const MAP_SWITCH_PROGRESS: f32 = 0.4;
/// Progress threshold for the emphasis style and identity fields.
const STYLE_SWITCH_PROGRESS: f32 = 0.5;
/// Contextual/stress rule sets flip early so rule-driven behavior leads the
/// numeric blend.
const RULES_SWITCH_PROGRESS: f32 = 0.3;

/// An accent profile mid-transition. Exists only while a transition is
/// active.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendedAccentProfile {
    pub profile: AccentProfile,
    /// Fraction of the target profile in effect; monotonically
    /// non-decreasing within one transition.
    pub blend_ratio: f32,
}

struct Transition {
    from: AccentProfile,
    to: AccentProfile,
    start_ms: f64,
    duration_ms: f64,
}

type CompletionCallback = Box<dyn Fn(&AccentProfile) + Send>;

/// Interpolates between two accent profiles over wall-clock time.
///
/// At most one transition is active; starting a new one force-completes the
/// previous transition first.
#[derive(Default)]
pub struct AccentTransitionBlender {
    transition: Option<Transition>,
    callbacks: Vec<CompletionCallback>,
}

impl AccentTransitionBlender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired with the profile in effect whenever a
    /// transition completes or is cancelled.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: Fn(&AccentProfile) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn start_transition(
        &mut self,
        from: AccentProfile,
        to: AccentProfile,
        now_ms: f64,
        duration_ms: f64,
    ) {
        if let Some(previous) = self.transition.take() {
            tracing::debug!(
                target: LOG_TARGET,
                "transition replaced; forcing previous to completion"
            );
            self.fire(&previous.to);
        }
        tracing::debug!(
            target: LOG_TARGET,
            from = %from.language,
            to = %to.language,
            duration_ms,
            "transition started"
        );
        self.transition = Some(Transition {
            from,
            to,
            start_ms: now_ms,
            duration_ms: duration_ms.max(1.0),
        });
    }

    /// Advance the transition. Returns the blended profile while active;
    /// `None` once complete (the completing call fires callbacks with the
    /// target profile).
    pub fn update(&mut self, now_ms: f64) -> Option<BlendedAccentProfile> {
        let transition = self.transition.as_ref()?;
        let progress = ((now_ms - transition.start_ms) / transition.duration_ms)
            .clamp(0.0, 1.0) as f32;

        if progress >= 1.0 {
            if let Some(finished) = self.transition.take() {
                tracing::debug!(target: LOG_TARGET, to = %finished.to.language, "transition complete");
                self.fire(&finished.to);
            }
            return None;
        }

        let eased = cubic_ease_in_out(progress);
        Some(BlendedAccentProfile {
            profile: blend_profiles(&transition.from, &transition.to, eased),
            blend_ratio: eased,
        })
    }

    /// Abort the transition and revert to the source profile.
    /// Idempotent: cancelling with no transition active does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancelled) = self.transition.take() {
            tracing::debug!(target: LOG_TARGET, from = %cancelled.from.language, "transition cancelled");
            self.fire(&cancelled.from);
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Raw (uneased) progress of the active transition, if any.
    pub fn progress(&self, now_ms: f64) -> Option<f32> {
        self.transition
            .as_ref()
            .map(|t| ((now_ms - t.start_ms) / t.duration_ms).clamp(0.0, 1.0) as f32)
    }

    fn fire(&self, profile: &AccentProfile) {
        for callback in &self.callbacks {
            callback(profile);
        }
    }
}

/// Numeric fields interpolate at `t`; categorical fields switch at fixed
/// thresholds because they cannot be meaningfully interpolated.
fn blend_profiles(from: &AccentProfile, to: &AccentProfile, t: f32) -> AccentProfile {
    let identity = if t >= STYLE_SWITCH_PROGRESS { to } else { from };
    let maps = if t >= MAP_SWITCH_PROGRESS { to } else { from };
    let rules = if t >= RULES_SWITCH_PROGRESS { to } else { from };

    let stress_pattern = lerp_series(&from.rhythm.stress_pattern, &to.rhythm.stress_pattern, t);
    let pause_durations = from
        .rhythm
        .pause_durations
        .iter()
        .zip(&to.rhythm.pause_durations)
        .map(|(a, b)| *a + (*b - *a) * t as f64)
        .collect();

    AccentProfile {
        language: identity.language.clone(),
        region: identity.region.clone(),
        vowel_map: maps.vowel_map.clone(),
        consonant_map: maps.consonant_map.clone(),
        rhythm: crate::accent::RhythmPattern {
            bpm: lerp(from.rhythm.bpm, to.rhythm.bpm, t),
            stress_pattern,
            pause_durations,
        },
        context_rules: rules.context_rules.clone(),
        stress_rules: rules.stress_rules.clone(),
        head_style: crate::accent::HeadMovementStyle {
            nod_frequency: lerp(from.head_style.nod_frequency, to.head_style.nod_frequency, t),
            tilt_tendency: lerp(from.head_style.tilt_tendency, to.head_style.tilt_tendency, t),
            emphasis_style: identity.head_style.emphasis_style,
        },
    }
}

fn lerp_series(from: &[f32], to: &[f32], t: f32) -> Vec<f32> {
    from.iter().zip(to).map(|(a, b)| lerp(*a, *b, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accent::AccentProfileStore;
    use crate::config::LanguageCode;
    use std::sync::{Arc, Mutex};

    fn profile(code: &str) -> AccentProfile {
        let store = AccentProfileStore::builtin();
        let lang = LanguageCode::new(code).expect("valid");
        (*store.get(&lang).expect("profile")).clone()
    }

    #[test]
    fn update_at_start_is_mostly_source() {
        let mut blender = AccentTransitionBlender::new();
        let (a, b) = (profile("en"), profile("es"));
        blender.start_transition(a.clone(), b, 1_000.0, 1_000.0);

        let blended = blender.update(1_000.0).expect("active");
        assert!(blended.blend_ratio < 1e-6);
        assert_eq!(blended.profile.rhythm.bpm, a.rhythm.bpm);
        assert_eq!(blended.profile.language, a.language);
        assert_eq!(blended.profile.vowel_map, a.vowel_map);
    }

    #[test]
    fn completes_after_duration_and_goes_quiet() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let mut blender = AccentTransitionBlender::new();
        let sink = Arc::clone(&done);
        blender.on_complete(move |p| sink.lock().unwrap().push(p.language.clone()));

        blender.start_transition(profile("en"), profile("es"), 0.0, 1_000.0);
        assert!(blender.is_transitioning());

        assert!(blender.update(1_000.0).is_none());
        assert!(!blender.is_transitioning());
        assert_eq!(*done.lock().unwrap(), vec!["es".to_owned()]);

        // Subsequent updates stay None without re-firing.
        assert!(blender.update(2_000.0).is_none());
        assert_eq!(done.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancel_reverts_to_source_profile() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let mut blender = AccentTransitionBlender::new();
        let sink = Arc::clone(&done);
        blender.on_complete(move |p| sink.lock().unwrap().push(p.language.clone()));

        blender.start_transition(profile("en"), profile("es"), 0.0, 1_000.0);
        blender.update(400.0);
        blender.cancel();

        assert!(!blender.is_transitioning());
        assert_eq!(*done.lock().unwrap(), vec!["en".to_owned()]);

        // Cancel is idempotent.
        blender.cancel();
        assert_eq!(done.lock().unwrap().len(), 1);
    }

    #[test]
    fn restart_forces_previous_to_completion() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let mut blender = AccentTransitionBlender::new();
        let sink = Arc::clone(&done);
        blender.on_complete(move |p| sink.lock().unwrap().push(p.language.clone()));

        blender.start_transition(profile("en"), profile("es"), 0.0, 1_000.0);
        blender.start_transition(profile("es"), profile("fr"), 200.0, 1_000.0);

        assert_eq!(*done.lock().unwrap(), vec!["es".to_owned()]);
        assert!(blender.is_transitioning());
    }

    #[test]
    fn blend_ratio_is_monotonic_and_numericals_interpolate() {
        let mut blender = AccentTransitionBlender::new();
        let (a, b) = (profile("en"), profile("de"));
        blender.start_transition(a.clone(), b.clone(), 0.0, 1_000.0);

        let mut prev_ratio = -1.0_f32;
        for step in 0..10 {
            let now = step as f64 * 100.0;
            let blended = blender.update(now).expect("active");
            assert!(blended.blend_ratio >= prev_ratio);
            prev_ratio = blended.blend_ratio;

            let bpm = blended.profile.rhythm.bpm;
            let (lo, hi) = if a.rhythm.bpm < b.rhythm.bpm {
                (a.rhythm.bpm, b.rhythm.bpm)
            } else {
                (b.rhythm.bpm, a.rhythm.bpm)
            };
            assert!(bpm >= lo && bpm <= hi);
        }
    }

    #[test]
    fn categorical_fields_switch_at_thresholds() {
        let mut blender = AccentTransitionBlender::new();
        let (a, b) = (profile("en"), profile("es"));
        blender.start_transition(a.clone(), b.clone(), 0.0, 1_000.0);

        // Early: still the source maps (eased progress below thresholds).
        let early = blender.update(300.0).expect("active");
        assert_eq!(early.profile.vowel_map, a.vowel_map);

        // Late: target maps and identity.
        let late = blender.update(800.0).expect("active");
        assert_eq!(late.profile.vowel_map, b.vowel_map);
        assert_eq!(late.profile.language, b.language);
    }

    #[test]
    fn progress_reports_raw_fraction() {
        let mut blender = AccentTransitionBlender::new();
        assert!(blender.progress(0.0).is_none());

        blender.start_transition(profile("en"), profile("ja"), 0.0, 2_000.0);
        let p = blender.progress(500.0).expect("active");
        assert!((p - 0.25).abs() < 1e-6);
    }
}
