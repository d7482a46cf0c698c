//! Finish gate geometry
//!
//! Five composited pieces (floor, two poles, two tape ends) placed from a single
//! anchor X and the ground line. The whole thing is a pure projection of
//! `{anchor_x, ground_y, tape_broken, tape_break_progress}` plus asset sizes;
//! nothing here is stored between frames.

use std::f32::consts::FRAC_PI_2;
use std::sync::LazyLock;

use glam::Vec2;
use serde::Serialize;

use super::keyframes::{Ease, KeyframeCurve};
use crate::assets::{AssetId, AssetMetrics, size_or_fallback};

const FLOOR_SCALE: f32 = 2.0;
/// Floor top sits this far above the ground line
const FLOOR_RISE: f32 = 84.0;

/// Pole base offsets from the anchor (world units)
const LEFT_POLE_OFFSET_X: f32 = -360.0;
const RIGHT_POLE_OFFSET_X: f32 = -240.0;
const POLE_BASE_RISE: f32 = 100.0;
/// The poles are deliberately different heights
const LEFT_POLE_SCALE: f32 = 1.8;
const RIGHT_POLE_SCALE: f32 = 1.35;

const TAPE_SCALE_X: f32 = 1.8;
const TAPE_SCALE_Y: f32 = 1.0;
/// Tape attachment points relative to each pole's base X / top Y
const LEFT_TAPE_ATTACH: Vec2 = Vec2::new(0.0, 40.0);
const RIGHT_TAPE_ATTACH: Vec2 = Vec2::new(-24.0, 58.0);

const LEFT_TAPE_INTACT: f32 = 0.4;
const RIGHT_TAPE_INTACT: f32 = -2.5;

// Snap past the rest angle, swing back, settle
static LEFT_TAPE_ROTATION: LazyLock<KeyframeCurve> = LazyLock::new(|| {
    KeyframeCurve::new(
        &[(0.0, LEFT_TAPE_INTACT), (0.3, 1.3), (0.6, 0.95), (0.8, 1.1), (1.0, 1.05)],
        Ease::SmoothStep,
    )
});
static RIGHT_TAPE_ROTATION: LazyLock<KeyframeCurve> = LazyLock::new(|| {
    KeyframeCurve::new(
        &[(0.0, RIGHT_TAPE_INTACT), (0.3, -3.45), (0.6, -3.15), (0.8, -3.3), (1.0, -3.25)],
        Ease::SmoothStep,
    )
});
static LEFT_TAPE_SKEW: LazyLock<KeyframeCurve> = LazyLock::new(|| {
    KeyframeCurve::new(
        &[(0.0, 0.0), (0.3, 0.22), (0.6, -0.1), (1.0, 0.0)],
        Ease::SmoothStep,
    )
});
static RIGHT_TAPE_SKEW: LazyLock<KeyframeCurve> = LazyLock::new(|| {
    KeyframeCurve::new(
        &[(0.0, 0.0), (0.3, -0.22), (0.6, 0.1), (1.0, 0.0)],
        Ease::SmoothStep,
    )
});

/// Inputs for one gate evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishGateInput {
    pub anchor_x: f32,
    pub ground_y: f32,
    pub tape_broken: bool,
    /// 0..1, ignored while the tape is intact
    pub tape_break_progress: f32,
}

/// One positioned piece.
///
/// `(x, y)` is the pivot; `anchor` is the pivot's position inside the
/// unrotated `width × height` box (0..1 on each axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateSprite {
    pub asset: AssetId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub skew_x: f32,
    pub anchor: Vec2,
}

impl GateSprite {
    /// Box corners after skew and rotation, in world space
    pub fn corners(&self) -> [Vec2; 4] {
        let origin = Vec2::new(-self.anchor.x * self.width, -self.anchor.y * self.height);
        let local = [
            origin,
            origin + Vec2::new(self.width, 0.0),
            origin + Vec2::new(self.width, self.height),
            origin + Vec2::new(0.0, self.height),
        ];
        let shear = self.skew_x.tan();
        let rot = Vec2::from_angle(self.rotation);
        let pivot = Vec2::new(self.x, self.y);
        local.map(|p| pivot + rot.rotate(Vec2::new(p.x + shear * p.y, p.y)))
    }

    pub fn bounds(&self) -> GateBounds {
        GateBounds::from_points(&self.corners())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl GateBounds {
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    pub fn union(&self, other: &GateBounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateSprites {
    pub floor: GateSprite,
    pub left_pole: GateSprite,
    pub right_pole: GateSprite,
    pub left_tape: GateSprite,
    pub right_tape: GateSprite,
}

impl GateSprites {
    pub fn iter(&self) -> impl Iterator<Item = &GateSprite> {
        [
            &self.floor,
            &self.left_pole,
            &self.right_pole,
            &self.left_tape,
            &self.right_tape,
        ]
        .into_iter()
    }
}

/// Where the player must cross to start breaking the tape
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapeLine {
    pub break_line_x: f32,
    pub break_line_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinishGateGeometry {
    pub sprites: GateSprites,
    pub tape: TapeLine,
    pub bounds: GateBounds,
}

/// Pole placement and tape pivots; independent of break progress
struct Frame {
    left_pole: GateSprite,
    right_pole: GateSprite,
    left_tape_pivot: Vec2,
    right_tape_pivot: Vec2,
}

fn pole(asset: AssetId, base_x: f32, base_y: f32, scale: f32, metrics: &dyn AssetMetrics) -> GateSprite {
    // Authored lying down: width is the pole's length once stood upright
    let size = size_or_fallback(metrics, asset) * scale;
    GateSprite {
        asset,
        x: base_x,
        y: base_y,
        width: size.x,
        height: size.y,
        rotation: -FRAC_PI_2,
        skew_x: 0.0,
        anchor: Vec2::new(0.0, 0.5),
    }
}

fn frame(anchor_x: f32, ground_y: f32, metrics: &dyn AssetMetrics) -> Frame {
    let base_y = ground_y - POLE_BASE_RISE;
    let left_pole = pole(
        AssetId::FinishPoleLeft,
        anchor_x + LEFT_POLE_OFFSET_X,
        base_y,
        LEFT_POLE_SCALE,
        metrics,
    );
    let right_pole = pole(
        AssetId::FinishPoleRight,
        anchor_x + RIGHT_POLE_OFFSET_X,
        base_y,
        RIGHT_POLE_SCALE,
        metrics,
    );

    let left_top = Vec2::new(left_pole.x, base_y - left_pole.width);
    let right_top = Vec2::new(right_pole.x, base_y - right_pole.width);

    Frame {
        left_pole,
        right_pole,
        left_tape_pivot: left_top + LEFT_TAPE_ATTACH,
        right_tape_pivot: right_top + RIGHT_TAPE_ATTACH,
    }
}

fn tape(asset: AssetId, pivot: Vec2, rotation: f32, skew_x: f32, metrics: &dyn AssetMetrics) -> GateSprite {
    let size = size_or_fallback(metrics, asset);
    GateSprite {
        asset,
        x: pivot.x,
        y: pivot.y,
        width: size.x * TAPE_SCALE_X,
        height: size.y * TAPE_SCALE_Y,
        rotation,
        skew_x,
        anchor: Vec2::ZERO,
    }
}

/// Trigger line from the intact tape pivots
fn break_line(frame: &Frame) -> TapeLine {
    let mid = (frame.left_tape_pivot + frame.right_tape_pivot) * 0.5;
    TapeLine {
        break_line_x: mid.x,
        break_line_y: mid.y,
    }
}

/// Place every gate piece for the given state.
///
/// Returns `None` for non-finite inputs: nothing to draw, nothing to trigger.
pub fn compute_finish_gate_geometry(
    input: &FinishGateInput,
    metrics: &dyn AssetMetrics,
) -> Option<FinishGateGeometry> {
    if !input.anchor_x.is_finite() || !input.ground_y.is_finite() {
        return None;
    }
    if input.tape_broken && !input.tape_break_progress.is_finite() {
        return None;
    }

    let frame = frame(input.anchor_x, input.ground_y, metrics);
    let tape_line = break_line(&frame);

    let (left_rot, right_rot, left_skew, right_skew) = if input.tape_broken {
        let p = input.tape_break_progress.clamp(0.0, 1.0);
        (
            LEFT_TAPE_ROTATION.sample(p),
            RIGHT_TAPE_ROTATION.sample(p),
            LEFT_TAPE_SKEW.sample(p),
            RIGHT_TAPE_SKEW.sample(p),
        )
    } else {
        (LEFT_TAPE_INTACT, RIGHT_TAPE_INTACT, 0.0, 0.0)
    };

    let floor_size = size_or_fallback(metrics, AssetId::FinishFloor) * FLOOR_SCALE;
    let floor = GateSprite {
        asset: AssetId::FinishFloor,
        x: input.anchor_x - floor_size.x * 0.5,
        y: input.ground_y - FLOOR_RISE,
        width: floor_size.x,
        height: floor_size.y,
        rotation: 0.0,
        skew_x: 0.0,
        anchor: Vec2::ZERO,
    };

    let sprites = GateSprites {
        floor,
        left_pole: frame.left_pole,
        right_pole: frame.right_pole,
        left_tape: tape(
            AssetId::FinishTapeLeft,
            frame.left_tape_pivot,
            left_rot,
            left_skew,
            metrics,
        ),
        right_tape: tape(
            AssetId::FinishTapeRight,
            frame.right_tape_pivot,
            right_rot,
            right_skew,
            metrics,
        ),
    };

    let bounds = sprites
        .iter()
        .map(GateSprite::bounds)
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or(floor.bounds());

    Some(FinishGateGeometry {
        sprites,
        tape: tape_line,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FallbackMetrics, StaticMetrics};
    use proptest::prelude::*;

    fn gate(anchor_x: f32, broken: bool, progress: f32) -> FinishGateGeometry {
        compute_finish_gate_geometry(
            &FinishGateInput {
                anchor_x,
                ground_y: 900.0,
                tape_broken: broken,
                tape_break_progress: progress,
            },
            &FallbackMetrics,
        )
        .unwrap()
    }

    #[test]
    fn test_trigger_line_and_bounds() {
        let g = gate(1000.0, false, 0.0);
        assert!((g.tape.break_line_x - (1000.0 - 312.0)).abs() < 2.0);
        assert!(g.bounds.width() > 700.0);
        assert!(g.bounds.max.x > 1000.0);
        assert!(g.bounds.min.x < 1000.0 - 300.0);
    }

    #[test]
    fn test_trigger_line_ignores_broken_state() {
        let base = gate(1200.0, false, 0.0);
        let broken = gate(1200.0, true, 1.0);
        let mid = gate(1200.0, true, 0.35);
        assert_eq!(base.tape, broken.tape);
        assert_eq!(base.tape, mid.tape);
    }

    #[test]
    fn test_tape_animates_through_intermediate_pose() {
        let intact = gate(1000.0, false, 0.0);
        let mid = gate(1000.0, true, 0.35);
        let done = gate(1000.0, true, 1.0);

        let (li, lm) = (intact.sprites.left_tape, mid.sprites.left_tape);
        assert!((lm.rotation - li.rotation).abs() > 1e-3);
        assert!((mid.sprites.right_tape.rotation - done.sprites.right_tape.rotation).abs() > 1e-3);
        // Pieces pivot in place
        assert_eq!(lm.x.round(), li.x.round());
        assert_eq!(lm.y.round(), li.y.round());
        assert!((done.sprites.left_tape.rotation - 1.05).abs() < 1e-6);
    }

    #[test]
    fn test_intact_tape_ignores_progress() {
        assert_eq!(gate(500.0, false, 0.0), gate(500.0, false, 0.8));
    }

    #[test]
    fn test_poles_are_asymmetric_and_upright() {
        let g = gate(1000.0, false, 0.0);
        let left = g.sprites.left_pole.bounds();
        let right = g.sprites.right_pole.bounds();
        assert!(left.height() > right.height());
        // Base rests at ground - 100
        assert!((left.max.y - 800.0).abs() < 1e-3);
        assert!((right.max.y - 800.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_inputs_yield_none() {
        let bad = FinishGateInput {
            anchor_x: f32::NAN,
            ground_y: 900.0,
            tape_broken: false,
            tape_break_progress: 0.0,
        };
        assert!(compute_finish_gate_geometry(&bad, &FallbackMetrics).is_none());
        let bad_progress = FinishGateInput {
            anchor_x: 0.0,
            ground_y: 900.0,
            tape_broken: true,
            tape_break_progress: f32::NAN,
        };
        assert!(compute_finish_gate_geometry(&bad_progress, &FallbackMetrics).is_none());
    }

    #[test]
    fn test_asset_sizes_drive_floor() {
        let mut metrics = StaticMetrics::new();
        metrics.insert(AssetId::FinishFloor, 300.0, 40.0);
        let g = compute_finish_gate_geometry(
            &FinishGateInput {
                anchor_x: 0.0,
                ground_y: 900.0,
                tape_broken: false,
                tape_break_progress: 0.0,
            },
            &metrics,
        )
        .unwrap();
        assert_eq!(g.sprites.floor.width, 600.0);
        assert_eq!(g.sprites.floor.x, -300.0);
    }

    proptest! {
        #[test]
        fn prop_trigger_line_translates_with_anchor(
            anchor in -5000.0f32..5000.0,
            delta in -2000.0f32..2000.0,
            progress in 0.0f32..=1.0,
        ) {
            let base = gate(anchor, false, 0.0);
            let shifted = gate(anchor + delta, true, progress);
            let moved = shifted.tape.break_line_x - base.tape.break_line_x;
            prop_assert!((moved - delta).abs() < 1e-2);
            prop_assert!((shifted.tape.break_line_y - base.tape.break_line_y).abs() < 1e-4);
        }

        #[test]
        fn prop_geometry_is_pure(anchor in -5000.0f32..5000.0, progress in 0.0f32..=1.0) {
            prop_assert_eq!(gate(anchor, true, progress), gate(anchor, true, progress));
        }
    }
}
