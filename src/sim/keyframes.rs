//! Reusable keyframe curves
//!
//! A curve is an ordered list of `(t, value)` keys plus an easing applied inside
//! every segment. Sampling outside the key range holds the end values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    #[default]
    SmoothStep,
    OutCubic,
    InOutSine,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::SmoothStep => t * t * (3.0 - 2.0 * t),
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
            Ease::InOutSine => -((std::f32::consts::PI * t).cos() - 1.0) * 0.5,
        }
    }
}

/// Single key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub t: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeCurve {
    keys: Vec<Key>,
    ease: Ease,
}

impl KeyframeCurve {
    /// Keys are sorted by `t`; non-finite keys are dropped
    pub fn new(keys: &[(f32, f32)], ease: Ease) -> Self {
        let mut keys: Vec<Key> = keys
            .iter()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|&(t, value)| Key { t, value })
            .collect();
        keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { keys, ease }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Value at `t`; an empty curve samples to zero
    pub fn sample(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if !t.is_finite() || t <= first.t {
            return first.value;
        }
        if t >= last.t {
            return last.value;
        }

        let idx = self.keys.partition_point(|k| k.t <= t);
        let a = self.keys[idx - 1];
        let b = self.keys[idx];
        let span = b.t - a.t;
        if span <= f32::EPSILON {
            return b.value;
        }
        let local = self.ease.apply((t - a.t) / span);
        a.value + (b.value - a.value) * local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints_are_stable() {
        for ease in [Ease::Linear, Ease::SmoothStep, Ease::OutCubic, Ease::InOutSine] {
            assert!(ease.apply(0.0).abs() < 1e-6);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sample_hits_keys_exactly() {
        let curve = KeyframeCurve::new(&[(0.0, 0.4), (0.35, 1.3), (1.0, 1.05)], Ease::SmoothStep);
        assert_eq!(curve.sample(0.0), 0.4);
        assert!((curve.sample(0.35) - 1.3).abs() < 1e-6);
        assert_eq!(curve.sample(1.0), 1.05);
    }

    #[test]
    fn test_sample_holds_outside_range() {
        let curve = KeyframeCurve::new(&[(0.2, 1.0), (0.8, 2.0)], Ease::Linear);
        assert_eq!(curve.sample(-1.0), 1.0);
        assert_eq!(curve.sample(5.0), 2.0);
        assert!((curve.sample(0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_smoothstep_differs_from_linear_mid_segment() {
        let linear = KeyframeCurve::new(&[(0.0, 0.0), (1.0, 1.0)], Ease::Linear);
        let smooth = KeyframeCurve::new(&[(0.0, 0.0), (1.0, 1.0)], Ease::SmoothStep);
        assert!((linear.sample(0.25) - smooth.sample(0.25)).abs() > 0.05);
    }

    #[test]
    fn test_unsorted_and_garbage_keys() {
        let curve = KeyframeCurve::new(&[(1.0, 3.0), (f32::NAN, 9.0), (0.0, 1.0)], Ease::Linear);
        assert_eq!(curve.keys().len(), 2);
        assert!((curve.sample(0.5) - 2.0).abs() < 1e-6);
        assert_eq!(KeyframeCurve::new(&[], Ease::Linear).sample(0.5), 0.0);
    }
}
