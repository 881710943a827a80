use crate::lipsync::{MorphWeightMap, MouthShape};
use crate::phoneme::Viseme;
use crate::util::clamp01;
use serde::{Deserialize, Serialize};

/// Fixed articulation parameters per viseme.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct VisemeParams {
    pub openness: f32,
    pub lip_position: f32,
    pub tongue_position: f32,
}

pub fn viseme_params(viseme: Viseme) -> VisemeParams {
    let (openness, lip_position, tongue_position) = match viseme {
        Viseme::Silence => (0.0, 0.0, 0.0),
        Viseme::PP => (0.05, -0.2, 0.0),
        Viseme::FF => (0.2, -0.4, 0.0),
        Viseme::TH => (0.25, 0.0, 0.8),
        Viseme::DD => (0.3, 0.0, 0.6),
        Viseme::KK => (0.35, 0.0, 0.2),
        Viseme::CH => (0.3, 0.5, 0.4),
        Viseme::SS => (0.2, -0.3, 0.5),
        Viseme::NN => (0.25, 0.0, 0.6),
        Viseme::RR => (0.3, 0.3, 0.4),
        Viseme::AA => (0.9, 0.0, 0.1),
        Viseme::E => (0.6, -0.4, 0.2),
        Viseme::I => (0.4, -0.6, 0.3),
        Viseme::O => (0.7, 0.8, 0.1),
        Viseme::U => (0.4, 0.9, 0.1),
    };
    VisemeParams {
        openness,
        lip_position,
        tongue_position,
    }
}

/// Maps a viseme at a given intensity onto named morph targets.
///
/// Injected at scheduler construction so the engine carries no knowledge of
/// the host rig's naming convention; hosts with a known rig supply their own
/// resolver.
pub trait MorphTargetResolver: Send {
    fn apply(&self, viseme: Viseme, intensity: f32, out: &mut MorphWeightMap);
}

/// Default resolver covering several rig naming conventions at once: each
/// viseme drives 1–4 targets so the same logical mouth shape reaches
/// differently-named blend-shape sets.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultMorphResolver;

impl DefaultMorphResolver {
    fn bindings(viseme: Viseme) -> &'static [(&'static str, f32)] {
        match viseme {
            Viseme::Silence => &[],
            Viseme::PP => &[("viseme_PP", 1.0), ("mouthClose", 0.8), ("mouthPucker", 0.3)],
            Viseme::FF => &[("viseme_FF", 1.0), ("mouthFunnel", 0.4)],
            Viseme::TH => &[("viseme_TH", 1.0), ("tongueOut", 0.5)],
            Viseme::DD => &[("viseme_DD", 1.0), ("mouthOpen", 0.3)],
            Viseme::KK => &[("viseme_kk", 1.0), ("mouthOpen", 0.35)],
            Viseme::CH => &[("viseme_CH", 1.0), ("mouthFunnel", 0.5), ("mouthOpen", 0.3)],
            Viseme::SS => &[("viseme_SS", 1.0), ("mouthStretchLeft", 0.2), ("mouthStretchRight", 0.2)],
            Viseme::NN => &[("viseme_nn", 1.0), ("mouthOpen", 0.25)],
            Viseme::RR => &[("viseme_RR", 1.0), ("mouthPucker", 0.3)],
            Viseme::AA => &[("viseme_aa", 1.0), ("mouthOpen", 0.9), ("jawOpen", 0.7)],
            Viseme::E => &[("viseme_E", 1.0), ("mouthOpen", 0.55), ("mouthSmile", 0.2)],
            Viseme::I => &[("viseme_I", 1.0), ("mouthSmile", 0.4), ("mouthOpen", 0.35)],
            Viseme::O => &[("viseme_O", 1.0), ("mouthFunnel", 0.7), ("jawOpen", 0.5), ("mouthOpen", 0.6)],
            Viseme::U => &[("viseme_U", 1.0), ("mouthPucker", 0.8), ("mouthFunnel", 0.5)],
        }
    }
}

impl MorphTargetResolver for DefaultMorphResolver {
    fn apply(&self, viseme: Viseme, intensity: f32, out: &mut MorphWeightMap) {
        for (name, weight) in Self::bindings(viseme) {
            let value = clamp01(weight * intensity);
            // Additive rigs may route two visemes to one target; keep the
            // strongest contribution.
            let entry = out.entry((*name).to_owned()).or_insert(0.0);
            if value > *entry {
                *entry = value;
            }
        }
    }
}

/// Scale viseme parameters by frame intensity.
pub fn shape_for(viseme: Viseme, intensity: f32) -> MouthShape {
    let params = viseme_params(viseme);
    MouthShape {
        openness: clamp01(params.openness * intensity),
        lip_position: (params.lip_position * intensity).clamp(-1.0, 1.0),
        tongue_position: clamp01(params.tongue_position * intensity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_produces_no_targets() {
        let mut out = MorphWeightMap::new();
        DefaultMorphResolver.apply(Viseme::Silence, 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn every_speaking_viseme_has_one_to_four_targets() {
        for viseme in [
            Viseme::PP,
            Viseme::FF,
            Viseme::TH,
            Viseme::DD,
            Viseme::KK,
            Viseme::CH,
            Viseme::SS,
            Viseme::NN,
            Viseme::RR,
            Viseme::AA,
            Viseme::E,
            Viseme::I,
            Viseme::O,
            Viseme::U,
        ] {
            let count = DefaultMorphResolver::bindings(viseme).len();
            assert!((1..=4).contains(&count), "{viseme:?}: {count}");
        }
    }

    #[test]
    fn weights_are_clamped_and_max_combined() {
        let mut out = MorphWeightMap::new();
        DefaultMorphResolver.apply(Viseme::AA, 2.0, &mut out);
        assert!(out.values().all(|w| (0.0..=1.0).contains(w)));

        // A second apply with lower intensity must not reduce weights.
        let aa_before = out["mouthOpen"];
        DefaultMorphResolver.apply(Viseme::O, 0.1, &mut out);
        assert!(out["mouthOpen"] >= aa_before);
    }

    #[test]
    fn open_vowel_opens_the_mouth() {
        let shape = shape_for(Viseme::AA, 1.0);
        assert!(shape.openness > 0.8);
        let closed = shape_for(Viseme::AA, 0.0);
        assert_eq!(closed.openness, 0.0);
    }
}
