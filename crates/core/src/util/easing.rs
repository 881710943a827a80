use serde::{Deserialize, Serialize};

/// Easing curves used by head movements and profile transitions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
    SinIn,
    SinOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => cubic_ease_in_out(t),
            Easing::SinIn => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Easing::SinOut => (t * std::f32::consts::FRAC_PI_2).sin(),
        }
    }
}

/// Standard cubic ease-in-out over t in [0, 1].
pub fn cubic_ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_ease_endpoints_and_midpoint() {
        assert_eq!(cubic_ease_in_out(0.0), 0.0);
        assert_eq!(cubic_ease_in_out(1.0), 1.0);
        assert!((cubic_ease_in_out(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cubic_ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = cubic_ease_in_out(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn lerp_interpolates() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
    }
}
