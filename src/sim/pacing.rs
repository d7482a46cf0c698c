//! Pacing curves and jump arc
//!
//! Small pure functions of score / progress. Kept apart from the tick so each
//! bound can be tested on its own.

/// Streak window (seconds) shrinks as the score climbs
pub const SPAWN_DELAY_MAX: f32 = 1.65;
pub const SPAWN_DELAY_MIN: f32 = 0.72;
const SPAWN_DELAY_PER_POINT: f32 = 0.01;

/// Running speed in world units per second
pub const SPEED_MIN: f32 = 360.0;
pub const SPEED_MAX: f32 = 580.0;
const SPEED_PER_POINT: f32 = 2.4;

/// Score gained per world unit traveled
const SCORE_PER_UNIT: f32 = 0.05;

pub fn next_spawn_delay(score: f32) -> f32 {
    let score = score.max(0.0);
    (SPAWN_DELAY_MAX - SPAWN_DELAY_PER_POINT * score).max(SPAWN_DELAY_MIN)
}

pub fn obstacle_speed(score: f32) -> f32 {
    let score = score.max(0.0);
    (SPEED_MIN + SPEED_PER_POINT * score).min(SPEED_MAX)
}

pub fn score_step(dt: f32, speed: f32) -> f32 {
    (dt * speed * SCORE_PER_UNIT).max(0.0)
}

/// Parabolic jump: back at `start_y` at both ends, `jump_height` above it at the apex
pub fn compute_jump_y(start_y: f32, progress: f32, jump_height: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    start_y - 4.0 * jump_height * p * (1.0 - p)
}

/// One deceleration step.
///
/// `rate` is the per-frame multiplier at the reference frame rate; the result
/// snaps to exactly zero once it falls under `floor`.
pub fn decay_speed(speed: f32, rate: f32, floor: f32, dt: f32) -> f32 {
    let frames = dt.max(0.0) * crate::consts::REFERENCE_FPS;
    let next = speed * rate.powf(frames);
    if next < floor { 0.0 } else { next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pacing_endpoints() {
        assert_eq!(next_spawn_delay(0.0), 1.65);
        assert_eq!(next_spawn_delay(1000.0), 0.72);
        assert_eq!(obstacle_speed(0.0), 360.0);
        assert_eq!(obstacle_speed(1000.0), 580.0);
    }

    #[test]
    fn test_jump_arc() {
        assert_eq!(compute_jump_y(1000.0, 0.0, 300.0), 1000.0);
        assert_eq!(compute_jump_y(1000.0, 1.0, 300.0), 1000.0);
        assert_eq!(compute_jump_y(1000.0, 0.5, 300.0), 700.0);
        assert!(compute_jump_y(1000.0, 0.25, 300.0) < 1000.0);
    }

    #[test]
    fn test_deceleration_reaches_zero() {
        let mut speed = 600.0;
        let mut ticks = 0;
        let dt = 1.0 / 60.0;
        while speed > 0.0 {
            speed = decay_speed(speed, 0.9, 10.0, dt);
            ticks += 1;
            assert!(speed == 0.0 || speed >= 10.0);
            assert!(ticks < 100, "deceleration lingered");
        }
        assert_eq!(speed, 0.0);
    }

    #[test]
    fn test_decay_with_zero_dt_holds() {
        assert_eq!(decay_speed(300.0, 0.9, 10.0, 0.0), 300.0);
    }

    proptest! {
        #[test]
        fn prop_pacing_is_bounded(score in -1000.0f32..100_000.0) {
            let delay = next_spawn_delay(score);
            let speed = obstacle_speed(score);
            prop_assert!((SPAWN_DELAY_MIN..=SPAWN_DELAY_MAX).contains(&delay));
            prop_assert!((SPEED_MIN..=SPEED_MAX).contains(&speed));
        }

        #[test]
        fn prop_pacing_is_monotonic(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(next_spawn_delay(lo) >= next_spawn_delay(hi));
            prop_assert!(obstacle_speed(lo) <= obstacle_speed(hi));
        }

        #[test]
        fn prop_jump_never_dips_below_start(
            start in -2000.0f32..2000.0,
            progress in 0.0f32..=1.0,
            height in 0.0f32..1000.0,
        ) {
            let y = compute_jump_y(start, progress, height);
            prop_assert!(y <= start + 1e-3);
            prop_assert!(y >= start - height - 1e-3);
        }

        #[test]
        fn prop_deceleration_is_bounded(start in 10.0f32..2000.0, fps in 30.0f32..144.0) {
            let dt = 1.0 / fps;
            let mut speed = start;
            let mut ticks = 0;
            while speed > 0.0 && ticks < 10_000 {
                speed = decay_speed(speed, 0.9, 10.0, dt);
                ticks += 1;
            }
            prop_assert_eq!(speed, 0.0);
        }
    }
}
